use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Runtime configuration collected from positional arguments and `MESHVIEW_*` variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Mesh to load; `None` spawns the procedural cube instead
    pub mesh_path: Option<PathBuf>,
    pub texture_path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
    pub camera_speed: f32,
    pub mouse_sensitivity: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mesh_path: None,
            texture_path: None,
            width: 1920,
            height: 1080,
            title: "meshview".to_string(),
            vsync: true,
            camera_speed: 2.5,
            mouse_sensitivity: 0.1,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        let vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with("MESHVIEW_"))
            .collect();
        Self::from_sources(&args, &vars)
    }

    /// Positional arguments win over environment variables.
    pub fn from_sources(args: &[String], vars: &HashMap<String, String>) -> Self {
        let mut config = Self::default();

        config.mesh_path = args
            .first()
            .cloned()
            .or_else(|| vars.get("MESHVIEW_MESH").cloned())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        config.texture_path = args
            .get(1)
            .cloned()
            .or_else(|| vars.get("MESHVIEW_TEXTURE").cloned())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        if let Some(title) = vars.get("MESHVIEW_TITLE") {
            config.title = title.clone();
        }
        parse_into(vars, "MESHVIEW_WIDTH", &mut config.width);
        parse_into(vars, "MESHVIEW_HEIGHT", &mut config.height);
        parse_into(vars, "MESHVIEW_CAMERA_SPEED", &mut config.camera_speed);
        parse_into(vars, "MESHVIEW_MOUSE_SENSITIVITY", &mut config.mouse_sensitivity);

        if let Some(raw) = vars.get("MESHVIEW_VSYNC") {
            match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => config.vsync = true,
                "0" | "false" | "off" | "no" => config.vsync = false,
                _ => tracing::warn!("ignoring MESHVIEW_VSYNC={raw:?}, expected a boolean"),
            }
        }

        config.width = config.width.max(1);
        config.height = config.height.max(1);
        config
    }
}

fn parse_into<T: FromStr>(vars: &HashMap<String, String>, key: &str, slot: &mut T) {
    if let Some(raw) = vars.get(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => tracing::warn!("ignoring {key}={raw:?}, keeping default"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = AppConfig::from_sources(&[], &HashMap::new());
        assert_eq!(config, AppConfig::default());
        assert_eq!((config.width, config.height), (1920, 1080));
        assert!(config.mesh_path.is_none());
    }

    #[test]
    fn test_args_override_env() {
        let args = vec!["monkey.obj".to_string()];
        let config = AppConfig::from_sources(
            &args,
            &vars(&[("MESHVIEW_MESH", "other.obj"), ("MESHVIEW_TEXTURE", "wood.png")]),
        );
        assert_eq!(config.mesh_path, Some(PathBuf::from("monkey.obj")));
        assert_eq!(config.texture_path, Some(PathBuf::from("wood.png")));
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = AppConfig::from_sources(
            &[],
            &vars(&[
                ("MESHVIEW_WIDTH", "wide"),
                ("MESHVIEW_HEIGHT", "720"),
                ("MESHVIEW_VSYNC", "off"),
                ("MESHVIEW_CAMERA_SPEED", "5.0"),
            ]),
        );
        assert_eq!(config.width, 1920);
        assert_eq!(config.height, 720);
        assert!(!config.vsync);
        assert_eq!(config.camera_speed, 5.0);
    }
}
