use nupak_util::errors::NupakError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = NupakError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_config_error_display() {
    let err = NupakError::Config {
        message: "bad syntax".to_string(),
    };
    assert_eq!(err.to_string(), "Configuration error: bad syntax");
}

#[test]
fn test_dependencies_error_display() {
    let err = NupakError::Dependencies {
        message: "line 3: unknown directive".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Dependencies file error: line 3: unknown directive"
    );
}

#[test]
fn test_lockfile_error_display() {
    let err = NupakError::LockFile {
        message: "line 2: dependency before any package".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Lock file error: line 2: dependency before any package"
    );
}

#[test]
fn test_generic_error_display() {
    let err = NupakError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: NupakError = io_err.into();
    assert!(matches!(err, NupakError::Io(_)));
}
