//! The editing session.
//!
//! A [`Session`] owns the [`AppState`], recomputes the plot after every edit and persists the
//! state through a [`StateStore`]. Each recomputation runs the whole pipeline: parameter
//! extraction, per-field validation, compilation and sampling. When the new texts do not
//! compile, the previous curve stays on screen and the errors are reported next to it.

use bumpalo::Bump;
use log::{debug, warn};

use crate::compiler::{Param, Slot, compile, validate_sources};
use crate::config::PlotConfig;
use crate::error::{CompileError, SampleError};
use crate::extract::extract_parameters;
use crate::sampler::{Point, polyline_points, sample_with};
use crate::state::{AppState, Edit, StateStore, load_state, save_state};

/// What the editor shows after a recomputation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Parameters discovered in the current texts, with their current values.
    pub parameters: Vec<Param>,
    /// The most recent successfully sampled polyline.
    pub points: Vec<Point>,
    /// Rendering of the most recent successfully compiled curve.
    pub rendering: Option<String>,
    /// Errors of the current texts, at most one per slot.
    pub errors: Vec<CompileError>,
    pub sample_error: Option<SampleError>,
}

impl Frame {
    pub fn error_for(&self, slot: Slot) -> Option<&CompileError> {
        self.errors.iter().find(|e| e.slot == slot)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.sample_error.is_none()
    }

    pub fn polyline(&self) -> String {
        polyline_points(&self.points)
    }
}

pub struct Session<S: StateStore> {
    state: AppState,
    config: PlotConfig,
    store: S,
    frame: Frame,
}

impl<S: StateStore> Session<S> {
    /// Open a session on the state saved in `store`, or on the defaults.
    pub fn open(store: S, config: PlotConfig) -> Self {
        let state = load_state(&store);
        let mut session = Self {
            state,
            config,
            store,
            frame: Frame::default(),
        };
        session.recompute();
        session
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one edit, persist the new state and recompute the frame.
    pub fn apply(&mut self, edit: Edit) -> &Frame {
        self.state.apply(edit);
        if let Err(err) = save_state(&mut self.store, &self.state) {
            warn!("failed to persist state: {}", err);
        }
        self.recompute();
        &self.frame
    }

    pub fn set_config(&mut self, config: PlotConfig) -> &Frame {
        self.config = config;
        self.recompute();
        &self.frame
    }

    /// Rebuild the frame from the current state.
    pub fn recompute(&mut self) {
        let sources = self.state.sources();
        let names = extract_parameters(&sources.texts());
        self.frame.parameters = names
            .iter()
            .map(|name| Param {
                name: name.clone(),
                value: self.state.env.get(name),
            })
            .collect();

        // reflects the current config even when the texts keep the curve from being sampled
        self.frame.sample_error = self.config.validate().err();
        self.frame.errors = validate_sources(&sources, &names);
        if !self.frame.errors.is_empty() {
            for err in &self.frame.errors {
                debug!("keeping previous curve: {}", err);
            }
            return;
        }

        let arena = Bump::new();
        let curve = match compile(&arena, &sources, &names, &self.state.env) {
            Ok(curve) => curve,
            Err(err) => {
                debug!("keeping previous curve: {}", err);
                self.frame.errors.push(err);
                return;
            }
        };

        match sample_with(&curve, &self.config) {
            Ok(points) => {
                debug!(
                    "recomputed curve: {} parameters, {} of {} points",
                    self.frame.parameters.len(),
                    points.len(),
                    self.config.steps + 1
                );
                self.frame.points = points;
                self.frame.rendering = Some(curve.rendering().to_string());
                self.frame.sample_error = None;
            }
            Err(err) => {
                warn!("unable to sample curve: {}", err);
                self.frame.sample_error = Some(err);
            }
        }
    }
}
