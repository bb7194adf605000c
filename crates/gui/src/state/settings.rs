//! Viewport settings

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Camera navigation speeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    /// Orbit speed in radians per viewport width of drag
    pub orbit_speed: f32,
    /// Forward step of shift+scroll, as a fraction of the depth of the hover point
    pub scroll_pan_step: f32,
    /// Zoom factor per scroll notch
    pub zoom_step: f32,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            orbit_speed: std::f32::consts::PI,
            scroll_pan_step: 0.1,
            zoom_step: 0.1,
        }
    }
}

/// Pick pass settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickSettings {
    /// Line width used for edges in the pick pass (pixels)
    pub edge_width: f32,
    /// Point size used for vertices in the pick pass (pixels)
    pub point_size: f32,
}

impl Default for PickSettings {
    fn default() -> Self {
        Self {
            edge_width: 6.0,
            point_size: 10.0,
        }
    }
}

/// Grid display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Show grid
    pub visible: bool,
    /// Grid cell size in world units
    pub size: f32,
    /// Number of grid lines in each direction from origin
    pub range: i32,
    /// Grid line opacity (0.0 - 1.0)
    pub opacity: f32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            visible: true,
            size: 1.0,
            range: 5,
            opacity: 0.6,
        }
    }
}

/// Axis display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisSettings {
    /// Show axes
    pub visible: bool,
    /// Axis arrow length
    pub length: f32,
    /// Show axis labels (X, Y, Z)
    pub show_labels: bool,
}

impl Default for AxisSettings {
    fn default() -> Self {
        Self {
            visible: true,
            length: 1.5,
            show_labels: true,
        }
    }
}

/// All viewport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub navigation: NavigationSettings,
    pub picking: PickSettings,
    pub grid: GridSettings,
    pub axes: AxisSettings,
    /// Background color RGB
    pub background_color: [u8; 3],
    /// Selection rectangle fill RGBA
    pub selection_fill: [u8; 4],
    /// Selection rectangle outline RGBA
    pub selection_outline: [u8; 4],
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            navigation: NavigationSettings::default(),
            picking: PickSettings::default(),
            grid: GridSettings::default(),
            axes: AxisSettings::default(),
            background_color: [30, 30, 35],
            selection_fill: [0, 220, 255, 40],
            selection_outline: [0, 220, 255, 200],
        }
    }
}

impl ViewportSettings {
    /// Load settings from the config dir, or return default if not found
    pub fn load() -> Self {
        if let Some(dirs) = directories::ProjectDirs::from("com", "solidpick", "solidpick") {
            let config_path = dirs.config_dir().join("settings.json");
            if let Ok(settings) = Self::load_from(&config_path) {
                tracing::info!("Loaded settings from {}", config_path.display());
                return settings;
            }
        }
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        let json = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&json).map_err(|e| format!("Invalid settings {}: {}", path.display(), e))
    }

    /// Save settings to the config dir
    pub fn save(&self) {
        if let Some(dirs) = directories::ProjectDirs::from("com", "solidpick", "solidpick") {
            let config_dir = dirs.config_dir();
            if std::fs::create_dir_all(config_dir).is_ok() {
                if let Err(e) = self.save_to(&config_dir.join("settings.json")) {
                    tracing::warn!("Failed to save settings: {}", e);
                }
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| e.to_string())
    }
}
