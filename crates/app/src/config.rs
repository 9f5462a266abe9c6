use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

/// Runtime settings for the capture-and-publish pipeline.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub camera: String,
    pub model_path: PathBuf,
    pub width: i32,
    pub height: i32,
    pub port: u16,
    pub jpeg_quality: i32,
    pub min_visibility: f32,
    pub verbose: bool,
}

const USAGE: &str = "Usage: pose-relay [--camera <index|/dev/videoN>] --model <path> \
[--width <px>] [--height <px>] [--port <port>] [--jpeg-quality <1-100>] \
[--min-visibility <0.0-1.0>] [--verbose]\n\nPositional form is also supported: \
pose-relay <camera> <model-path>";

impl RelayConfig {
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut camera: Option<String> = None;
        let mut model_path: Option<PathBuf> = None;
        let mut width: Option<i32> = None;
        let mut height: Option<i32> = None;
        let mut port: Option<u16> = None;
        let mut jpeg_quality: Option<i32> = None;
        let mut min_visibility: Option<f32> = None;
        let mut verbose = false;
        let mut positional: Vec<String> = Vec::new();

        let mut idx = 1;
        while idx < args.len() {
            match args[idx].as_str() {
                "--camera" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--camera requires a value"))?
                        .clone();
                    camera = Some(value);
                    idx += 1;
                }
                "--model" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--model requires a value"))?
                        .clone();
                    model_path = Some(PathBuf::from(value));
                    idx += 1;
                }
                "--width" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--width requires a value"))?
                        .parse::<i32>()
                        .with_context(|| "--width must be a positive integer".to_string())?;
                    if value <= 0 {
                        bail!("--width must be a positive integer");
                    }
                    width = Some(value);
                    idx += 1;
                }
                "--height" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--height requires a value"))?
                        .parse::<i32>()
                        .with_context(|| "--height must be a positive integer".to_string())?;
                    if value <= 0 {
                        bail!("--height must be a positive integer");
                    }
                    height = Some(value);
                    idx += 1;
                }
                "--port" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--port requires a value"))?
                        .parse::<u16>()
                        .with_context(|| "--port must be a port number".to_string())?;
                    port = Some(value);
                    idx += 1;
                }
                "--jpeg-quality" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--jpeg-quality requires a value"))?
                        .parse::<i32>()
                        .with_context(|| {
                            "--jpeg-quality must be an integer between 1 and 100".to_string()
                        })?;
                    if !(1..=100).contains(&value) {
                        bail!("--jpeg-quality must be an integer between 1 and 100");
                    }
                    jpeg_quality = Some(value);
                    idx += 1;
                }
                "--min-visibility" => {
                    idx += 1;
                    let value = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--min-visibility requires a value"))?
                        .parse::<f32>()
                        .with_context(|| {
                            "--min-visibility must be a number between 0.0 and 1.0".to_string()
                        })?;
                    if !(0.0..=1.0).contains(&value) {
                        bail!("--min-visibility must be a number between 0.0 and 1.0");
                    }
                    min_visibility = Some(value);
                    idx += 1;
                }
                "--verbose" => {
                    verbose = true;
                    idx += 1;
                }
                "--help" | "-h" => bail!(USAGE),
                arg if arg.starts_with('-') => {
                    bail!("Unrecognised flag: {arg}\n\n{USAGE}");
                }
                other => {
                    positional.push(other.to_string());
                    idx += 1;
                }
            }
        }

        let mut positional = positional.into_iter();
        if camera.is_none() {
            camera = positional.next();
        }
        if model_path.is_none() {
            if let Some(path) = positional.next() {
                model_path = Some(PathBuf::from(path));
            }
        }

        let model_path = model_path.ok_or_else(|| {
            anyhow!("Missing model path. Provide --model <path> or positional <model-path>.\n\n{USAGE}")
        })?;

        Ok(Self {
            camera: camera.unwrap_or_else(|| "0".to_string()),
            model_path,
            width: width.unwrap_or(640),
            height: height.unwrap_or(480),
            port: port.unwrap_or(8080),
            jpeg_quality: jpeg_quality.unwrap_or(85),
            min_visibility: min_visibility.unwrap_or(0.5),
            verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("pose-relay")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_fill_everything_but_the_model() {
        let config = RelayConfig::from_args(&args(&["--model", "pose.onnx"])).unwrap();
        assert_eq!(config.camera, "0");
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 480);
        assert_eq!(config.port, 8080);
        assert_eq!(config.jpeg_quality, 85);
        assert!(!config.verbose);
    }

    #[test]
    fn flags_override_defaults() {
        let config = RelayConfig::from_args(&args(&[
            "--camera",
            "/dev/video2",
            "--model",
            "pose.onnx",
            "--width",
            "1280",
            "--height",
            "720",
            "--port",
            "9000",
            "--verbose",
        ]))
        .unwrap();
        assert_eq!(config.camera, "/dev/video2");
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert_eq!(config.port, 9000);
        assert!(config.verbose);
    }

    #[test]
    fn positional_camera_and_model_are_accepted() {
        let config = RelayConfig::from_args(&args(&["1", "pose.onnx"])).unwrap();
        assert_eq!(config.camera, "1");
        assert_eq!(config.model_path, PathBuf::from("pose.onnx"));
    }

    #[test]
    fn missing_model_is_an_error() {
        let err = RelayConfig::from_args(&args(&[])).unwrap_err();
        assert!(err.to_string().contains("model path"));
    }

    #[test]
    fn jpeg_quality_is_range_checked() {
        let err =
            RelayConfig::from_args(&args(&["--model", "pose.onnx", "--jpeg-quality", "0"]))
                .unwrap_err();
        assert!(err.to_string().contains("between 1 and 100"));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let err = RelayConfig::from_args(&args(&["--model", "pose.onnx", "--nope"])).unwrap_err();
        assert!(err.to_string().contains("Unrecognised flag"));
    }
}
