use kasvu_mem::CapacityError;

#[derive(Debug)]
pub enum LogError {
    Capacity(CapacityError),
    Io(std::io::Error),
}

impl core::fmt::Display for LogError {

    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Capacity(err) => write!(f, "log format error: {}", err),
            Self::Io(_) => write!(f, "IO error"),
        }
    }
}

impl core::error::Error for LogError {

    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Capacity(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<CapacityError> for LogError {

    fn from(value: CapacityError) -> Self {
        Self::Capacity(value)
    }
}

impl From<std::io::Error> for LogError {

    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
