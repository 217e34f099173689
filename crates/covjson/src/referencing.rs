//! Reference system selection.
//!
//! Which reference systems a grid needs depends only on which axes it has:
//!
//! | t | z | referencing                |
//! |---|---|----------------------------|
//! | ✓ | ✓ | `[Temporal, Spatial3D]`    |
//! | ✓ |   | `[Temporal, Spatial2D]`    |
//! |   | ✓ | `[Spatial3D]`              |
//! |   |   | `[Spatial2D]`              |

use crate::coverage_json::{AxisName, AxisSet, ReferenceSystem, ReferenceSystemConnection};

/// CRS84: longitude/latitude on WGS 84.
pub const CRS84: &str = "http://www.opengis.net/def/crs/OGC/1.3/CRS84";

/// EPSG:4979: longitude/latitude/ellipsoidal height on WGS 84.
pub const EPSG_4979: &str = "http://www.opengis.net/def/crs/EPSG/0/4979";

/// Calendar used for temporal axes.
pub const GREGORIAN: &str = "Gregorian";

/// The reference systems a grid domain can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSystemDescriptor {
    /// Gregorian calendar over `t`.
    Temporal,
    /// Geographic CRS over `x`, `y`.
    Spatial2D,
    /// Geographic CRS over `x`, `y`, `z`.
    Spatial3D,
}

impl ReferenceSystemDescriptor {
    /// The axes this reference system governs.
    pub fn coordinates(&self) -> &'static [AxisName] {
        match self {
            ReferenceSystemDescriptor::Temporal => &[AxisName::T],
            ReferenceSystemDescriptor::Spatial2D => &[AxisName::X, AxisName::Y],
            ReferenceSystemDescriptor::Spatial3D => &[AxisName::X, AxisName::Y, AxisName::Z],
        }
    }

    pub fn system(&self) -> ReferenceSystem {
        match self {
            ReferenceSystemDescriptor::Temporal => ReferenceSystem::Temporal {
                calendar: GREGORIAN.to_string(),
            },
            ReferenceSystemDescriptor::Spatial2D => ReferenceSystem::Geographic {
                id: CRS84.to_string(),
            },
            ReferenceSystemDescriptor::Spatial3D => ReferenceSystem::Geographic {
                id: EPSG_4979.to_string(),
            },
        }
    }

    /// The document form of this descriptor.
    pub fn to_connection(&self) -> ReferenceSystemConnection {
        ReferenceSystemConnection {
            coordinates: self
                .coordinates()
                .iter()
                .map(|axis| axis.as_str().to_string())
                .collect(),
            system: self.system(),
        }
    }
}

/// Select the reference systems for a set of present axes.
///
/// A vertical axis without a time axis yields `[Spatial3D]`.
pub fn select_reference_systems(axes: &AxisSet) -> Vec<ReferenceSystemDescriptor> {
    let has_t = axes.contains(AxisName::T);
    let has_z = axes.contains(AxisName::Z);

    let spatial = if has_z {
        ReferenceSystemDescriptor::Spatial3D
    } else {
        ReferenceSystemDescriptor::Spatial2D
    };

    if has_t {
        vec![ReferenceSystemDescriptor::Temporal, spatial]
    } else {
        vec![spatial]
    }
}
