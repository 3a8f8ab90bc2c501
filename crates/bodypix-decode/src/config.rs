//! Decode configuration.
//!
//! Every field has a default and can be overridden per call, either through
//! the `with_*` setters or by deserializing a JSON document in which missing
//! fields fall back to their defaults.

use crate::error::{DecodeError, DecodeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which assignment engine to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePreference {
    /// Pick the parallel engine when more than one worker thread is available
    #[default]
    Auto,
    /// Always run the sequential host engine
    Host,
    /// Always run the batched parallel engine
    Parallel,
}

/// Options for decoding per-person masks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Poses scoring below this are dropped before assignment
    #[serde(default = "default_min_pose_score")]
    pub min_pose_score: f32,
    /// Number of offset-walk iterations per foreground cell
    #[serde(default = "default_refine_steps")]
    pub refine_steps: usize,
    /// Pose keypoints scoring below this are not assignment targets
    #[serde(default = "default_min_keypoint_score")]
    pub min_keypoint_score: f32,
    /// Static pose batch size of the parallel engine
    #[serde(default = "default_max_num_people")]
    pub max_num_people: usize,
    /// Keypoint indices compared between a cell's embedding and each pose
    #[serde(default = "default_matching_keypoints")]
    pub matching_keypoints: Vec<usize>,
    /// Engine selection
    #[serde(default)]
    pub engine: EnginePreference,
}

fn default_min_pose_score() -> f32 {
    0.2
}

fn default_refine_steps() -> usize {
    8
}

fn default_min_keypoint_score() -> f32 {
    0.3
}

fn default_max_num_people() -> usize {
    10
}

fn default_matching_keypoints() -> Vec<usize> {
    vec![0]
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            min_pose_score: default_min_pose_score(),
            refine_steps: default_refine_steps(),
            min_keypoint_score: default_min_keypoint_score(),
            max_num_people: default_max_num_people(),
            matching_keypoints: default_matching_keypoints(),
            engine: EnginePreference::default(),
        }
    }
}

impl DecodeConfig {
    /// Parse a configuration from JSON
    pub fn from_json_str(json: &str) -> DecodeResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> DecodeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Validate configuration
    pub fn validate(&self) -> DecodeResult<()> {
        if !(0.0..=1.0).contains(&self.min_pose_score) {
            return Err(DecodeError::config(format!(
                "min_pose_score must be in [0, 1], got {}",
                self.min_pose_score
            )));
        }
        if !(0.0..=1.0).contains(&self.min_keypoint_score) {
            return Err(DecodeError::config(format!(
                "min_keypoint_score must be in [0, 1], got {}",
                self.min_keypoint_score
            )));
        }
        if self.max_num_people == 0 {
            return Err(DecodeError::config("max_num_people must be positive"));
        }
        if self.matching_keypoints.is_empty() {
            return Err(DecodeError::config("matching_keypoints must not be empty"));
        }
        Ok(())
    }

    /// Set the minimum pose score
    pub fn with_min_pose_score(mut self, score: f32) -> Self {
        self.min_pose_score = score;
        self
    }

    /// Set the number of refinement steps
    pub fn with_refine_steps(mut self, steps: usize) -> Self {
        self.refine_steps = steps;
        self
    }

    /// Set the minimum keypoint score
    pub fn with_min_keypoint_score(mut self, score: f32) -> Self {
        self.min_keypoint_score = score;
        self
    }

    /// Set the parallel engine's pose batch size
    pub fn with_max_num_people(mut self, n: usize) -> Self {
        self.max_num_people = n;
        self
    }

    /// Set the keypoints used for matching
    pub fn with_matching_keypoints(mut self, keypoints: Vec<usize>) -> Self {
        self.matching_keypoints = keypoints;
        self
    }

    /// Set the engine preference
    pub fn with_engine(mut self, engine: EnginePreference) -> Self {
        self.engine = engine;
        self
    }
}
