use thiserror::Error;

#[derive(Error, Debug)]
pub enum TracerError {
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(#[from] wgpu::RequestAdapterError),

    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    #[error("Failed to create surface: {0}")]
    SurfaceCreateFailed(#[from] wgpu::CreateSurfaceError),

    #[error("Surface is not supported by the selected adapter")]
    SurfaceUnsupported,

    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Invalid material: {0}")]
    InvalidMaterial(String),
}

impl From<image::ImageError> for TracerError {
    fn from(err: image::ImageError) -> Self {
        TracerError::ImageDecode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TracerError>;
