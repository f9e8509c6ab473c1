use thiserror::Error;

/// Why a framebuffer cannot be drawn to or read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FramebufferError {
    #[error("Framebuffer Incomplete: Incomplete Attachment.")]
    IncompleteAttachment,
    #[error("Unsupported framebuffer format.")]
    UnsupportedFormat,
    #[error("Framebuffer Incomplete: Missing attachment.")]
    MissingAttachment,
    #[error("Framebuffer Incomplete: Missing draw buffer.")]
    MissingDrawBuffer,
    #[error("Framebuffer Incomplete: Missing read buffer.")]
    MissingReadBuffer,
}
