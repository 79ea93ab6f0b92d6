// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Caller-facing request payload. Every key is optional; numeric limits of
// zero (or below) mean "unbounded".

use serde::{Deserialize, Serialize};

use crate::error::{BildwerkError, Result};
use crate::types::{
    AspectRatio, Constraints, CropSettings, CropShape, ImageSource, OutputSize, PickerConfig,
};

/// The JSON payload exactly as callers send it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PickerRequest {
    /// 0 = Library, 1 = Camera.
    pub source: i64,
    pub max_file_size: i64,
    pub min_width: i64,
    pub min_height: i64,
    pub max_width: i64,
    pub max_height: i64,
    pub enable_crop: bool,
    /// 0 = Rectangle, 1 = Circle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_shape: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_height: Option<i64>,
}

impl PickerRequest {
    /// Parse the raw payload. Anything that is not a JSON object with the
    /// expected field types is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| BildwerkError::MalformedRequest(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Build the payload for a config. Crop keys are only emitted when crop
    /// is enabled.
    pub fn from_config(config: &PickerConfig) -> Self {
        let c = &config.constraints;
        let mut request = Self {
            source: match config.source {
                ImageSource::Library => 0,
                ImageSource::Camera => 1,
            },
            max_file_size: c.max_file_size as i64,
            min_width: c.min_width.into(),
            min_height: c.min_height.into(),
            max_width: c.max_width.into(),
            max_height: c.max_height.into(),
            enable_crop: config.crop.enabled,
            ..Self::default()
        };

        if config.crop.enabled {
            let crop = &config.crop;
            request.crop_shape = Some(match crop.shape {
                CropShape::Rectangle => 0,
                CropShape::Circle => 1,
            });
            let (ax, ay) = crop.aspect_ratio.map_or((0.0, 0.0), |a| (a.x, a.y));
            request.aspect_ratio_x = Some(ax.into());
            request.aspect_ratio_y = Some(ay.into());
            let (ow, oh) = crop
                .max_output_size
                .map_or((0, 0), |s| (s.width, s.height));
            request.max_output_width = Some(ow.into());
            request.max_output_height = Some(oh.into());
        }

        request
    }

    /// Validate and convert into the immutable session configuration.
    pub fn into_config(self) -> Result<PickerConfig> {
        let source = match self.source {
            0 => ImageSource::Library,
            1 => ImageSource::Camera,
            other => {
                return Err(BildwerkError::MalformedRequest(format!(
                    "unknown source {other}"
                )));
            }
        };

        let shape = match self.crop_shape.unwrap_or(0) {
            0 => CropShape::Rectangle,
            1 => CropShape::Circle,
            other => {
                return Err(BildwerkError::MalformedRequest(format!(
                    "unknown cropShape {other}"
                )));
            }
        };

        let ax = self.aspect_ratio_x.unwrap_or(0.0);
        let ay = self.aspect_ratio_y.unwrap_or(0.0);
        if !ax.is_finite() || !ay.is_finite() {
            return Err(BildwerkError::MalformedRequest(
                "aspect ratio must be finite".into(),
            ));
        }
        let aspect_ratio = (ax > 0.0 && ay > 0.0).then_some(AspectRatio {
            x: ax as f32,
            y: ay as f32,
        });

        let ow = limit("maxOutputWidth", self.max_output_width.unwrap_or(0))?;
        let oh = limit("maxOutputHeight", self.max_output_height.unwrap_or(0))?;
        let max_output_size = (ow > 0 && oh > 0).then_some(OutputSize {
            width: ow,
            height: oh,
        });

        let constraints = Constraints {
            max_file_size: self.max_file_size.max(0) as u64,
            min_width: limit("minWidth", self.min_width)?,
            min_height: limit("minHeight", self.min_height)?,
            max_width: limit("maxWidth", self.max_width)?,
            max_height: limit("maxHeight", self.max_height)?,
        };

        Ok(PickerConfig {
            source,
            constraints,
            crop: CropSettings {
                enabled: self.enable_crop,
                shape,
                aspect_ratio,
                max_output_size,
            },
        })
    }
}

impl PickerConfig {
    /// Parse a caller payload straight into a config.
    pub fn from_request_json(json: &str) -> Result<Self> {
        PickerRequest::from_json(json)?.into_config()
    }
}

/// Clamp a pixel limit: non-positive is unbounded, beyond `u32` is malformed.
fn limit(name: &str, value: i64) -> Result<u32> {
    if value <= 0 {
        return Ok(0);
    }
    u32::try_from(value)
        .map_err(|_| BildwerkError::MalformedRequest(format!("{name} out of range: {value}")))
}
