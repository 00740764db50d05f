//! The slice session: one explicit state machine from aiming a cut to
//! returning to the 3D world.
//!
//! ```text
//! Idle -> Aiming -> Committed -> InSlice -> Idle
//!           |           |
//!           +-> Idle    +-> Idle (abort)
//! ```
//!
//! The player is reached only through the [`Freezable`] and [`Placeable`]
//! capabilities, and the scene only through [`GroundProbe`], so the session
//! knows nothing about any particular character controller.

use crate::basis::{AimState, BasisMode, SliceBasis};
use crate::config::SliceConfig;
use crate::errors::{Result, SliceError};
use crate::float_types::Real;
use crate::mesh::TriangleMesh;
use crate::slicer::{CrossSection, slice_meshes};
use nalgebra::{Point2, Point3, UnitQuaternion, Vector2};

pub mod probe;
pub mod return_mapper;

pub use probe::{GroundHit, GroundProbe, TriMeshGroundProbe};
pub use return_mapper::{MappedReturn, ReturnMapper, SurfaceResolution, apply_deadzone, map_return};

/// Something that can be suspended while its owner lives in the 2D level.
pub trait Freezable {
    fn freeze(&mut self);
    fn unfreeze(&mut self);
}

/// Something with a world pose that can be moved.
pub trait Placeable {
    fn position(&self) -> Point3<Real>;
    fn orientation(&self) -> UnitQuaternion<Real>;
    fn place(&mut self, position: Point3<Real>, orientation: UnitQuaternion<Real>);
}

/// Everything captured when a slice is committed.
///
/// The basis is fixed for the lifetime of the session; only the accumulated
/// displacement changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceSession {
    basis: SliceBasis,
    entry_position: Point3<Real>,
    entry_orientation: UnitQuaternion<Real>,
    displacement: Vector2<Real>,
    cross_section: CrossSection,
}

impl SliceSession {
    pub const fn basis(&self) -> &SliceBasis {
        &self.basis
    }

    pub const fn entry_position(&self) -> Point3<Real> {
        self.entry_position
    }

    pub const fn entry_orientation(&self) -> UnitQuaternion<Real> {
        self.entry_orientation
    }

    /// Where the player starts in slice space.
    pub fn entry_point_2d(&self) -> Point2<Real> {
        self.basis.to_plane_space(&self.entry_position)
    }

    /// Sum of the displacements recorded so far, in slice-space units.
    pub const fn displacement(&self) -> Vector2<Real> {
        self.displacement
    }

    pub const fn cross_section(&self) -> &CrossSection {
        &self.cross_section
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    /// Preview only: the basis is recomputed from every aim update and
    /// nothing in the world changes.
    Aiming { aim: AimState, preview: SliceBasis },
    /// The pipeline ran and the player is frozen; the 2D level is being
    /// built from the cross-section.
    Committed(SliceSession),
    InSlice(SliceSession),
}

impl SessionState {
    pub const fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Aiming { .. } => "aiming",
            SessionState::Committed(_) => "committed",
            SessionState::InSlice(_) => "in slice",
        }
    }

    pub const fn is_active(&self) -> bool {
        matches!(self, SessionState::Committed(_) | SessionState::InSlice(_))
    }
}

/// Owner of the single slice session.
#[derive(Debug, Clone)]
pub struct SliceController {
    config: SliceConfig,
    mode: BasisMode,
    state: SessionState,
}

impl SliceController {
    /// ## Errors
    /// If `config` fails [`SliceConfig::validate`].
    pub fn new(config: SliceConfig, mode: BasisMode) -> Result<Self> {
        config.validate()?;
        Ok(SliceController {
            config,
            mode,
            state: SessionState::Idle,
        })
    }

    pub const fn config(&self) -> &SliceConfig {
        &self.config
    }

    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// The committed or running session, if any.
    pub const fn session(&self) -> Option<&SliceSession> {
        match &self.state {
            SessionState::Committed(session) | SessionState::InSlice(session) => Some(session),
            _ => None,
        }
    }

    /// Rejection for `action` in the current state.
    fn rejected(&self, action: &'static str) -> SliceError {
        SliceError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    /// Start (or restart) aiming and return the preview basis.
    pub fn begin_aim(&mut self, aim: AimState) -> Result<SliceBasis> {
        if self.state.is_active() {
            return Err(SliceError::SessionActive);
        }
        let preview = aim.capture(self.mode, self.config.up());
        self.state = SessionState::Aiming { aim, preview };
        Ok(preview)
    }

    /// Recompute the preview basis from new aim state.
    pub fn update_aim(&mut self, aim: AimState) -> Result<SliceBasis> {
        if !matches!(self.state, SessionState::Aiming { .. }) {
            return Err(self.rejected("update aim"));
        }
        let preview = aim.capture(self.mode, self.config.up());
        self.state = SessionState::Aiming { aim, preview };
        Ok(preview)
    }

    pub fn cancel_aim(&mut self) -> Result<()> {
        if !matches!(self.state, SessionState::Aiming { .. }) {
            return Err(self.rejected("cancel aim"));
        }
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Capture the basis from the current aim, run the slice pipeline over
    /// `meshes` and freeze `player`.
    ///
    /// Nothing changes if this fails: the controller stays in `Aiming` and
    /// the player is untouched.
    pub fn commit<'a, I, P>(&mut self, meshes: I, player: &mut P) -> Result<&CrossSection>
    where
        I: IntoIterator<Item = &'a TriangleMesh>,
        P: Freezable + Placeable + ?Sized,
    {
        let aim = match &self.state {
            SessionState::Aiming { aim, .. } => *aim,
            state if state.is_active() => return Err(SliceError::SessionActive),
            _ => return Err(self.rejected("commit")),
        };

        let basis = aim.capture(self.mode, self.config.up());
        let cross_section = slice_meshes(meshes, &basis, &self.config)?;
        if cross_section.is_empty() {
            log::debug!("commit: the plane cuts no solid geometry");
        }

        player.freeze();
        self.state = SessionState::Committed(SliceSession {
            basis,
            entry_position: player.position(),
            entry_orientation: player.orientation(),
            displacement: Vector2::zeros(),
            cross_section,
        });
        let SessionState::Committed(session) = &self.state else {
            unreachable!("state was set to committed above");
        };
        Ok(&session.cross_section)
    }

    /// Drop a committed session before entering it and unfreeze `player`.
    pub fn abort<P>(&mut self, player: &mut P) -> Result<()>
    where
        P: Freezable + ?Sized,
    {
        if !matches!(self.state, SessionState::Committed(_)) {
            return Err(self.rejected("abort"));
        }
        self.state = SessionState::Idle;
        player.unfreeze();
        Ok(())
    }

    /// The 2D level is ready; start accepting displacement. Returns the
    /// player's starting point in slice space.
    pub fn enter(&mut self) -> Result<Point2<Real>> {
        match std::mem::take(&mut self.state) {
            SessionState::Committed(session) => {
                let entry = session.entry_point_2d();
                self.state = SessionState::InSlice(session);
                Ok(entry)
            },
            other => {
                self.state = other;
                Err(self.rejected("enter"))
            },
        }
    }

    /// Add `delta` (slice-space units) to the accumulated displacement and
    /// return the new total.
    pub fn record_displacement(&mut self, delta: Vector2<Real>) -> Result<Vector2<Real>> {
        if let SessionState::InSlice(session) = &mut self.state {
            session.displacement += delta;
            return Ok(session.displacement);
        }
        Err(self.rejected("record displacement"))
    }

    /// Leave the 2D level: map the accumulated displacement back into the
    /// world, place `player` there with its pre-slice orientation, unfreeze
    /// it and return to `Idle`.
    pub fn exit<G, P>(&mut self, probe: &G, player: &mut P) -> Result<MappedReturn>
    where
        G: GroundProbe + ?Sized,
        P: Freezable + Placeable + ?Sized,
    {
        let SessionState::InSlice(session) = &self.state else {
            return Err(self.rejected("exit"));
        };

        let mapped = ReturnMapper::new(&self.config).map_return(
            session.displacement,
            &session.basis,
            &session.entry_position,
            probe,
        );
        player.place(mapped.position, session.entry_orientation);
        player.unfreeze();
        self.state = SessionState::Idle;

        log::debug!(
            "exit: moved {:?} along the plane, placed at {} ({:?})",
            mapped.delta_3d.as_slice(),
            mapped.position,
            mapped.surface
        );
        Ok(mapped)
    }
}
