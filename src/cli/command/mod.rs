pub mod analyze;
pub mod compare;
pub mod enrich;
pub mod suggest;

use std::path::PathBuf;

use chrono::{Datelike, Local};
pub use analyze::analyze;
pub use compare::compare;
pub use enrich::enrich;
pub use suggest::suggest;

/// Date-stamped output file in the home directory.
pub fn make_output_file_name(stem: &str, extension: &str) -> PathBuf {
    let today = Local::now();
    let file_name = format!(
        "sitescout-{}-{}-{:02}-{:02}.{}",
        stem,
        today.year(),
        today.month(),
        today.day(),
        extension
    );

    dirs::home_dir().unwrap().join(file_name)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_stamp_output_file_name_with_date() {
        let path = make_output_file_name("enriched", "csv");
        let name = path.file_name().unwrap().to_string_lossy();

        assert!(name.starts_with("sitescout-enriched-"));
        assert!(name.ends_with(".csv"));
    }
}
