//! Failure modes of the extension loader. A load failure must be a
//! descriptive, immediate error: a model that needs custom operators cannot
//! run without its extension, so nothing here is recoverable.

use std::io::Write;

use tensorgraph_inference::errors::ExtensionError;
use tensorgraph_inference::load_extension;

#[test]
fn missing_library_fails_to_load() {
    let result = load_extension("testdata/no_such_extension.so");
    assert!(matches!(
        result,
        Err(ExtensionError::LoadFailed { path, .. })
            if path.ends_with("no_such_extension.so")
    ));
}

#[test]
fn non_library_file_fails_to_load() {
    let path = std::env::temp_dir().join("tg_ext_not_a_library.so");
    {
        let mut file = std::fs::File::create(&path).expect("temp file");
        file.write_all(b"this is not a shared library")
            .expect("write temp file");
    }

    let result = load_extension(&path);
    assert!(matches!(result, Err(ExtensionError::LoadFailed { .. })));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn load_failure_names_the_path() {
    let err = load_extension("testdata/no_such_extension.so")
        .err()
        .expect("load must fail");
    let message = err.to_string();
    assert!(
        message.contains("no_such_extension.so"),
        "error should name the library path, got: {message}"
    );
}
