//! Image assets: window icon, play/pause icons and the avatar animation
//!
//! Assets are decoded once at startup. A missing or broken file aborts the
//! launch with [`CatMiniError::AssetLoadError`].

use crate::{CatMiniError, Result};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageReader, RgbaImage};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ASSETS_DIR_VAR: &str = "CATMINI_ASSETS_DIR";

pub const ICON_FILE: &str = "icon.ico";
pub const PLAY_FILE: &str = "speaker.png";
pub const PAUSE_FILE: &str = "pause.png";
pub const AVATAR_FILE: &str = "avatar.gif";

/// Decoded RGBA image
#[derive(Clone)]
pub struct AssetImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl AssetImage {
    fn from_rgba(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        }
    }

    fn to_color_image(&self) -> egui::ColorImage {
        egui::ColorImage::from_rgba_unmultiplied(
            [self.width as usize, self.height as usize],
            &self.rgba,
        )
    }
}

pub struct Assets {
    pub icon: AssetImage,
    pub play: AssetImage,
    pub pause: AssetImage,
    pub avatar_frames: Vec<AssetImage>,
}

impl Assets {
    /// Find the assets directory and decode everything in it
    pub fn load(configured: Option<&Path>) -> Result<Self> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let env_dir = std::env::var_os(ASSETS_DIR_VAR).map(PathBuf::from);

        let candidates = candidate_dirs(configured, env_dir, exe_dir);
        let dir = candidates
            .iter()
            .find(|dir| dir.join(ICON_FILE).is_file())
            .cloned()
            .ok_or_else(|| {
                let searched: Vec<String> =
                    candidates.iter().map(|d| d.display().to_string()).collect();
                CatMiniError::AssetLoadError(format!(
                    "No assets directory found (searched: {})",
                    searched.join(", ")
                ))
            })?;

        Self::load_from(&dir)
    }

    /// Decode the assets in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let icon = load_image(&dir.join(ICON_FILE))?;
        let play = load_image(&dir.join(PLAY_FILE))?;
        let pause = load_image(&dir.join(PAUSE_FILE))?;
        let avatar_frames = load_animation(&dir.join(AVATAR_FILE))?;

        info!(
            "Loaded assets from {} ({} avatar frames)",
            dir.display(),
            avatar_frames.len()
        );

        Ok(Self {
            icon,
            play,
            pause,
            avatar_frames,
        })
    }

    pub fn window_icon(&self) -> egui::IconData {
        egui::IconData {
            rgba: self.icon.rgba.clone(),
            width: self.icon.width,
            height: self.icon.height,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.avatar_frames.len()
    }
}

/// Directories searched for assets, most specific first
pub fn candidate_dirs(
    configured: Option<&Path>,
    env_dir: Option<PathBuf>,
    exe_dir: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = configured {
        dirs.push(dir.to_path_buf());
    }
    if let Some(dir) = env_dir {
        dirs.push(dir);
    }
    if let Some(dir) = exe_dir {
        dirs.push(dir.join("assets"));
    }
    dirs.push(PathBuf::from("assets"));
    dirs
}

fn load_image(path: &Path) -> Result<AssetImage> {
    let image = ImageReader::open(path)
        .map_err(|e| asset_error(path, e))?
        .with_guessed_format()
        .map_err(|e| asset_error(path, e))?
        .decode()
        .map_err(|e| asset_error(path, e))?;
    debug!("Decoded {} ({}x{})", path.display(), image.width(), image.height());
    Ok(AssetImage::from_rgba(image.to_rgba8()))
}

fn load_animation(path: &Path) -> Result<Vec<AssetImage>> {
    let file = File::open(path).map_err(|e| asset_error(path, e))?;
    let decoder = GifDecoder::new(BufReader::new(file)).map_err(|e| asset_error(path, e))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| asset_error(path, e))?;

    if frames.is_empty() {
        return Err(CatMiniError::AssetLoadError(format!(
            "{} has no frames",
            path.display()
        )));
    }

    Ok(frames
        .into_iter()
        .map(|frame| AssetImage::from_rgba(frame.into_buffer()))
        .collect())
}

fn asset_error(path: &Path, error: impl std::fmt::Display) -> CatMiniError {
    CatMiniError::AssetLoadError(format!("{}: {}", path.display(), error))
}

/// Assets uploaded to the GPU
pub struct AssetTextures {
    pub icon: egui::TextureHandle,
    pub play: egui::TextureHandle,
    pub pause: egui::TextureHandle,
    pub avatar: Vec<egui::TextureHandle>,
}

impl AssetTextures {
    pub fn upload(ctx: &egui::Context, assets: &Assets) -> Self {
        let options = egui::TextureOptions::LINEAR;
        let avatar = assets
            .avatar_frames
            .iter()
            .enumerate()
            .map(|(i, frame)| ctx.load_texture(format!("avatar-{}", i), frame.to_color_image(), options))
            .collect();

        Self {
            icon: ctx.load_texture("icon", assets.icon.to_color_image(), options),
            play: ctx.load_texture("play", assets.play.to_color_image(), options),
            pause: ctx.load_texture("pause", assets.pause.to_color_image(), options),
            avatar,
        }
    }

    /// Texture for an avatar frame; out-of-range indices show the first frame
    pub fn avatar_frame(&self, index: usize) -> Option<&egui::TextureHandle> {
        self.avatar.get(index).or_else(|| self.avatar.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgba};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("catmini-assets-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_assets(dir: &Path, frames: usize) {
        let square = RgbaImage::from_pixel(16, 16, Rgba([200, 120, 40, 255]));
        square.save(dir.join(ICON_FILE)).unwrap();
        square.save(dir.join(PLAY_FILE)).unwrap();
        square.save(dir.join(PAUSE_FILE)).unwrap();

        let file = File::create(dir.join(AVATAR_FILE)).unwrap();
        let mut encoder = GifEncoder::new(file);
        let frames = (0..frames).map(|i| {
            let shade = (i * 60) as u8;
            Frame::from_parts(
                RgbaImage::from_pixel(8, 8, Rgba([shade, shade, shade, 255])),
                0,
                0,
                Delay::from_numer_denom_ms(100, 1),
            )
        });
        encoder.encode_frames(frames).unwrap();
    }

    #[test]
    fn test_candidate_order() {
        let dirs = candidate_dirs(
            Some(Path::new("/configured")),
            Some(PathBuf::from("/env")),
            Some(PathBuf::from("/opt/catmini")),
        );
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/configured"),
                PathBuf::from("/env"),
                PathBuf::from("/opt/catmini/assets"),
                PathBuf::from("assets"),
            ]
        );
    }

    #[test]
    fn test_load_from_dir() {
        let dir = temp_dir();
        write_assets(&dir, 3);

        let assets = Assets::load_from(&dir).unwrap();
        assert_eq!(assets.frame_count(), 3);
        assert_eq!(assets.play.width, 16);
        assert_eq!(assets.window_icon().rgba.len(), 16 * 16 * 4);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_asset_is_an_error() {
        let dir = temp_dir();
        write_assets(&dir, 2);
        std::fs::remove_file(dir.join(PAUSE_FILE)).unwrap();

        match Assets::load_from(&dir) {
            Err(CatMiniError::AssetLoadError(message)) => assert!(message.contains(PAUSE_FILE)),
            other => panic!("expected asset error, got {:?}", other.map(|a| a.frame_count())),
        }

        let _ = std::fs::remove_dir_all(dir);
    }
}
