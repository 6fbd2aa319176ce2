/// Extensions accepted for uploaded images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "svg"];

/// Why an uploaded filename was refused.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    Empty,
    /// `/` or `\` anywhere in the name.
    ContainsPathSeparator,
    /// Starts with a dot, including `.` and `..`.
    Hidden,
    /// NUL, CR, LF, tab or any other control character.
    ControlCharacter,
    UnsupportedExtension,
    /// The extension maps to a non-image MIME type.
    NotAnImage,
}

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::Hidden => "Invalid filename: names starting with '.' are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::UnsupportedExtension => "Images must be jpeg, jpg, png, gif or svg",
            Self::NotAnImage => "Uploaded file is not an image",
        }
    }
}

/// Validate a client-supplied filename as a flat image name and return it
/// trimmed, together with its guessed MIME type.
pub fn validate_image_filename(filename: &str) -> Result<(&str, mime_guess::Mime), FilenameError> {
    let name = filename.trim();

    if name.is_empty() {
        return Err(FilenameError::Empty);
    }
    // Control characters would also allow header injection when echoed back.
    if name.chars().any(|c| c.is_control()) {
        return Err(FilenameError::ControlCharacter);
    }
    if name.contains(['/', '\\']) {
        return Err(FilenameError::ContainsPathSeparator);
    }
    if name.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or(FilenameError::UnsupportedExtension)?;
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(FilenameError::UnsupportedExtension);
    }

    let mime = mime_guess::from_ext(&ext)
        .first()
        .ok_or(FilenameError::NotAnImage)?;
    if mime.type_() != mime_guess::mime::IMAGE {
        return Err(FilenameError::NotAnImage);
    }

    Ok((name, mime))
}
