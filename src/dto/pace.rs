use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dao::models::{HoleTargetEntity, PaceConfigEntity, PaceSettingsEntity};

/// Alert thresholds and notification toggles for one club.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct PaceSettingsDto {
    /// Minutes of delay before a flight is flagged as drifting.
    #[validate(range(min = 1, max = 15, message = "warning threshold must be 1-15 minutes"))]
    pub warning_threshold_minutes: u32,
    /// Minutes of cumulative delay that trigger pace alerts.
    #[validate(range(min = 10, max = 30, message = "alert threshold must be 10-30 minutes"))]
    pub alert_threshold_minutes: u32,
    /// Notify the flight itself when the alert threshold is crossed.
    pub auto_notify_player: bool,
    /// Notify the marshall stream when the alert threshold is crossed.
    pub auto_notify_marshall: bool,
    /// Ask the monitoring UI to play an alert tone.
    pub enable_audio_alerts: bool,
}

impl From<PaceSettingsEntity> for PaceSettingsDto {
    fn from(value: PaceSettingsEntity) -> Self {
        Self {
            warning_threshold_minutes: value.warning_threshold_minutes,
            alert_threshold_minutes: value.alert_threshold_minutes,
            auto_notify_player: value.auto_notify_player,
            auto_notify_marshall: value.auto_notify_marshall,
            enable_audio_alerts: value.enable_audio_alerts,
        }
    }
}

impl From<PaceSettingsDto> for PaceSettingsEntity {
    fn from(value: PaceSettingsDto) -> Self {
        Self {
            warning_threshold_minutes: value.warning_threshold_minutes,
            alert_threshold_minutes: value.alert_threshold_minutes,
            auto_notify_player: value.auto_notify_player,
            auto_notify_marshall: value.auto_notify_marshall,
            enable_audio_alerts: value.enable_audio_alerts,
        }
    }
}

/// Target timing and optional scorecard metadata for one hole.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct HoleTargetDto {
    /// Expected minutes to play the hole.
    #[validate(range(min = 1, message = "hole target must be at least one minute"))]
    pub target_minutes: u32,
    /// Par, when the course metadata provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub par: Option<u8>,
    /// Stroke index, when the course metadata provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_index: Option<u8>,
}

impl From<HoleTargetEntity> for HoleTargetDto {
    fn from(value: HoleTargetEntity) -> Self {
        Self {
            target_minutes: value.target_minutes,
            par: value.par,
            stroke_index: value.stroke_index,
        }
    }
}

impl From<HoleTargetDto> for HoleTargetEntity {
    fn from(value: HoleTargetDto) -> Self {
        Self {
            target_minutes: value.target_minutes,
            par: value.par,
            stroke_index: value.stroke_index,
        }
    }
}

/// Pace-of-play configuration for one (club, course) pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct PaceConfigDto {
    /// Per-hole targets keyed by hole number.
    #[validate(nested)]
    pub holes: HashMap<u8, HoleTargetDto>,
    /// Club-wide thresholds and toggles.
    #[validate(nested)]
    pub settings: PaceSettingsDto,
}

impl From<PaceConfigEntity> for PaceConfigDto {
    fn from(value: PaceConfigEntity) -> Self {
        Self {
            holes: value
                .holes
                .into_iter()
                .map(|(number, target)| (number, target.into()))
                .collect(),
            settings: value.settings.into(),
        }
    }
}

impl From<PaceConfigDto> for PaceConfigEntity {
    fn from(value: PaceConfigDto) -> Self {
        Self {
            holes: value
                .holes
                .into_iter()
                .map(|(number, target)| (number, target.into()))
                .collect(),
            settings: value.settings.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_outside_bands_are_rejected() {
        let mut settings: PaceSettingsDto = PaceSettingsEntity::default().into();
        assert!(settings.validate().is_ok());

        settings.warning_threshold_minutes = 0;
        assert!(settings.validate().is_err());

        settings.warning_threshold_minutes = 5;
        settings.alert_threshold_minutes = 31;
        assert!(settings.validate().is_err());
    }
}
