//! Integration tests for the `fetch` command.
use minigrid::cli::{ProfileOpts, handle_fetch_command};
use minigrid::model::Model;
use minigrid::settings::Settings;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Get the path to the demo model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

/// Copy the demo model to `dest`, adding a `generation.toml` fetching the given years.
fn write_model(dest: &Path, start_year: u32, end_year: u32) {
    fs::create_dir(dest).unwrap();
    for entry in fs::read_dir(get_model_dir()).unwrap() {
        let path = entry.unwrap().path();
        fs::copy(&path, dest.join(path.file_name().unwrap())).unwrap();
    }

    // Nothing should be requested, so the API address is never contacted
    fs::write(
        dest.join("generation.toml"),
        format!(
            "token = \"abc\"\nlatitude = 10.0\nlongitude = 20.0\nstart_year = {start_year}\n\
             end_year = {end_year}\nsleep_seconds = 0\nbase_url = \"http://127.0.0.1:9/\"\n\n\
             [solar]\ntilt = 30.0\nazimuth = 180.0\n"
        ),
    )
    .unwrap();
}

/// An integration test for the `fetch` command, using yearly profiles which already exist.
#[test]
fn test_handle_fetch_command() {
    unsafe { std::env::set_var("MINIGRID_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let model_dir = tempdir.path().join("model");
    write_model(&model_dir, 2010, 2019);

    let output_dir = tempdir.path().join("profiles");
    fs::create_dir(&output_dir).unwrap();
    for year in 2010..=2019 {
        let contents: String = std::iter::once("electricity\n".to_string())
            .chain((0..24).map(|hour| format!("{}\n", year - 2010 + hour)))
            .collect();
        fs::write(
            output_dir.join(format!("solar_generation_{year}.csv")),
            contents,
        )
        .unwrap();
    }

    let opts = ProfileOpts {
        output_dir: Some(output_dir.clone()),
        regenerate: false,
    };
    handle_fetch_command(&model_dir, &opts, Some(Settings::default())).unwrap();

    // The demo has a 20-year lifetime, so ten years of profiles are used twice
    let total = fs::read_to_string(output_dir.join("solar_generation_20_years.csv")).unwrap();
    let mut lines = total.lines();
    assert_eq!(lines.next(), Some("electricity"));
    assert_eq!(lines.count(), 2 * 10 * 24);
}

/// Fetching fewer years than a total profile needs is rejected when the model is loaded.
#[test]
fn test_fetch_years_must_cover_lifetime() {
    let tempdir = tempdir().unwrap();
    let model_dir = tempdir.path().join("model");
    write_model(&model_dir, 2015, 2015);

    let err = Model::from_path(&model_dir).err().unwrap();
    assert!(
        format!("{err:?}").contains(
            "start_year (2015) to end_year (2015) covers 1 years, but a 20-year system lifetime \
             needs profiles for 10 years"
        ),
        "{err:?}"
    );
}
