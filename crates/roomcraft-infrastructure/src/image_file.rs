//! Reading room photos from disk and writing results back.

use roomcraft_core::image::sniff_mime_type;
use roomcraft_core::{EncodedImage, Result, RoomcraftError};
use std::path::Path;

/// Reads an image file.
///
/// The MIME type is taken from the file content when recognizable and
/// guessed from the extension otherwise.
pub async fn read_image_file(path: &Path) -> Result<EncodedImage> {
    let bytes = tokio::fs::read(path).await?;
    let mime_type = match sniff_mime_type(&bytes) {
        Some(mime) => mime.to_string(),
        None => mime_guess::from_path(path)
            .first()
            .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
            .map(|mime| mime.essence_str().to_string())
            .ok_or_else(|| {
                RoomcraftError::image_processing(format!("{} is not a recognized image", path.display()))
            })?,
    };
    EncodedImage::new(mime_type, bytes)
}

/// Writes an image to disk, creating parent directories as needed.
pub async fn write_image_file(path: &Path, image: &EncodedImage) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, image.bytes()).await?;
    tracing::info!(path = %path.display(), bytes = image.len(), "Wrote image file");
    Ok(())
}

/// File extension matching an image's MIME type, for naming downloads.
pub fn extension_for(image: &EncodedImage) -> &'static str {
    mime_guess::get_mime_extensions_str(image.mime_type())
        .and_then(|extensions| {
            // Prefer the common spelling for JPEG
            if extensions.contains(&"jpg") {
                Some("jpg")
            } else {
                extensions.first().copied()
            }
        })
        .unwrap_or("bin")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("room.jpg");
        let image = EncodedImage::new("image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2]).unwrap();

        write_image_file(&path, &image).await.unwrap();
        let loaded = read_image_file(&path).await.unwrap();
        assert_eq!(loaded, image);
    }

    #[tokio::test]
    async fn test_mime_falls_back_to_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("room.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let loaded = read_image_file(&path).await.unwrap();
        assert_eq!(loaded.mime_type(), "image/png");
    }

    #[tokio::test]
    async fn test_rejects_non_images() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(read_image_file(&path).await.is_err());

        let empty = temp_dir.path().join("empty.png");
        std::fs::write(&empty, b"").unwrap();
        assert!(read_image_file(&empty).await.is_err());

        assert!(read_image_file(&temp_dir.path().join("missing.png")).await.is_err());
    }

    #[test]
    fn test_extension_for() {
        let jpeg = EncodedImage::new("image/jpeg", vec![1]).unwrap();
        let png = EncodedImage::new("image/png", vec![1]).unwrap();
        assert_eq!(extension_for(&jpeg), "jpg");
        assert_eq!(extension_for(&png), "png");
    }
}
