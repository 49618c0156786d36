use std::io::Write;

use pathtrace_wgpu::quality::{SkyboxMode, MAX_SAMPLES_PER_PIXEL};
use pathtrace_wgpu::settings::TracerSettings;
use pathtrace_wgpu::TracerError;

#[test]
fn settings_file_is_loaded_and_clamped() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "width": 800, "height": 600, "samples_per_pixel": 500, "skybox": "vaporwave", "denoise": false }}"#
    )
    .unwrap();

    let settings = TracerSettings::load(file.path()).unwrap();
    assert_eq!((settings.width, settings.height), (800, 600));
    assert_eq!(settings.samples_per_pixel, MAX_SAMPLES_PER_PIXEL);
    assert_eq!(settings.ray_bounce_limit, TracerSettings::default().ray_bounce_limit);
    assert_eq!(settings.skybox, SkyboxMode::Vaporwave);
    assert!(!settings.denoise);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TracerSettings::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, TracerError::Io(_)), "{err}");
}
