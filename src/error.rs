use std::env;
use std::fmt::{self, Debug, Display};

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    /// Codes below 100 are internal failures, everything above is a rejected
    /// user action.
    pub fn is_user_facing(&self) -> bool {
        self.code >= 100
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        storage_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        serialization_error(err)
    }
}

pub fn invalid_state_error() -> Error {
    Error {
        code: 100,
        message: "invalid state".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "Complete all fields!".into(),
    }
}

pub fn invalid_kind_error(kind: &str) -> Error {
    Error {
        code: 102,
        message: format!("unknown place kind: {:?}", kind),
    }
}

pub fn geolocation_error() -> Error {
    Error {
        code: 103,
        message: "Could not get your position".into(),
    }
}

pub fn invalid_command_error(line: &str) -> Error {
    Error {
        code: 104,
        message: format!("unrecognized command: {}", line.trim()),
    }
}

pub fn no_location_error() -> Error {
    Error {
        code: 105,
        message: "Click on the map to choose a location first".into(),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn config_error(name: &str) -> Error {
    Error {
        code: 2,
        message: format!("invalid configuration value for {}", name),
    }
}

pub fn storage_error<T: Debug>(err: T) -> Error {
    Error {
        code: 3,
        message: format!("storage error: {:?}", err),
    }
}

pub fn serialization_error<T: Display>(err: T) -> Error {
    Error {
        code: 4,
        message: format!("serialization error: {}", err),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}
