//! # image-renamer
//!
//! AI-powered image renamer. Sends each image to a vision model (Google
//! Gemini or Zhipu GLM-4V), turns its short description into a clean,
//! dated filename, and renames the file without ever overwriting another.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use image_renamer::analyzer::ImageAnalyzer;
//! use image_renamer::config::Config;
//! use image_renamer::renamer::Renamer;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // API key, model, language, offline mode, ...
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!
//!     // The provider is picked once, from the model name
//!     let analyzer = ImageAnalyzer::from_config(&config);
//!     let renamer = Renamer::new(&analyzer, &config);
//!
//!     let paths = [PathBuf::from("./photos")];
//!     let plans = renamer.preview_rename(&paths).await?;
//!     for plan in &plans {
//!         println!("{} → {:?}", plan.original_name, plan.suggested_name);
//!     }
//!
//!     // Reuse the preview so no image is analyzed twice
//!     let report = renamer.perform_rename(&paths, false, Some(&plans)).await?;
//!     println!(
//!         "{} renamed, {} skipped, {} failed",
//!         report.summary.success, report.summary.skipped, report.summary.failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Naming
//!
//! | Situation | Base name |
//! |-----------|-----------|
//! | Model answered "Cat on Windowsill!!" (English) | `2024-05-06_cat_on_windowsill` |
//! | Model call failed, or answer cleaned to nothing | `2024-05-06_image_20240506101500` |
//! | Offline, descriptive original name `photo.JPG` | `2024-05-06_photo` |
//! | Offline, camera name `IMG_0001.png`, 6 MiB | `2024-05-06_xlarge_image` |
//!
//! The original extension is always kept as found on disk.
//!
//! ## Modules
//!
//! - [`ai`]: Vision service trait, Gemini and GLM clients, structured provider errors
//! - [`analyzer`]: Image → suggested base name, with offline and fallback paths
//! - [`config`]: Configuration types and loading/saving
//! - [`metadata`]: File size, dates, MIME type and header dimensions
//! - [`naming`]: Sanitizer, fallback and offline name builders
//! - [`pipeline`]: Image collection and format detection
//! - [`renamer`]: Scan, preview and rename batches with progress events

pub mod ai;
pub mod analyzer;
pub mod config;
pub mod metadata;
pub mod naming;
pub mod pipeline;
pub mod renamer;
