//! Standard metadata conventions
//!
//! Well-known entries that DCC applications read from PRT files: distance
//! unit, coordinate system, frame rate and bounding box.

use std::fmt;
use std::io::{Read, Seek};

use prt_core::format::constants::metadata::BOUND_BOX;

use crate::error::Result;
use crate::reader::ParticleReader;
use crate::writer::ParticleWriterBuilder;

/// Metadata entry holding a [`DistanceUnit`] as int32[1]
pub const DISTANCE_UNIT: &str = "DistanceUnit";

/// Metadata entry holding a [`CoordinateSystem`] as int32[1]
pub const COORDINATE_SYSTEM: &str = "CoordSys";

/// Metadata entry holding the frame rate as uint32[2] (numerator, denominator)
pub const FRAME_RATE: &str = "FrameRate";

/// Unit of the distances stored in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum DistanceUnit {
    #[default]
    Unitless = 0,
    Inches = 1,
    Feet = 2,
    Miles = 3,
    Millimeters = 4,
    Centimeters = 5,
    Meters = 6,
    Kilometers = 7,
}

impl DistanceUnit {
    pub const ALL: [DistanceUnit; 8] = [
        DistanceUnit::Unitless,
        DistanceUnit::Inches,
        DistanceUnit::Feet,
        DistanceUnit::Miles,
        DistanceUnit::Millimeters,
        DistanceUnit::Centimeters,
        DistanceUnit::Meters,
        DistanceUnit::Kilometers,
    ];

    pub fn from_ordinal(value: i32) -> Option<Self> {
        usize::try_from(value).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub const fn name(self) -> &'static str {
        match self {
            DistanceUnit::Unitless => "unitless",
            DistanceUnit::Inches => "inches",
            DistanceUnit::Feet => "feet",
            DistanceUnit::Miles => "miles",
            DistanceUnit::Millimeters => "millimeters",
            DistanceUnit::Centimeters => "centimeters",
            DistanceUnit::Meters => "meters",
            DistanceUnit::Kilometers => "kilometers",
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handedness and up axis of the file's coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum CoordinateSystem {
    #[default]
    Unspecified = 0,
    LeftHandedXUp = 1,
    LeftHandedYUp = 2,
    LeftHandedZUp = 3,
    RightHandedXUp = 4,
    RightHandedYUp = 5,
    RightHandedZUp = 6,
}

impl CoordinateSystem {
    /// 3ds Max
    pub const MAX: Self = CoordinateSystem::RightHandedZUp;
    pub const MAYA: Self = CoordinateSystem::RightHandedYUp;
    /// Softimage
    pub const XSI: Self = CoordinateSystem::RightHandedYUp;
    pub const HOUDINI: Self = CoordinateSystem::RightHandedYUp;
    pub const CINEMA4D: Self = CoordinateSystem::LeftHandedYUp;
    pub const REALFLOW: Self = CoordinateSystem::LeftHandedYUp;

    pub const ALL: [CoordinateSystem; 7] = [
        CoordinateSystem::Unspecified,
        CoordinateSystem::LeftHandedXUp,
        CoordinateSystem::LeftHandedYUp,
        CoordinateSystem::LeftHandedZUp,
        CoordinateSystem::RightHandedXUp,
        CoordinateSystem::RightHandedYUp,
        CoordinateSystem::RightHandedZUp,
    ];

    pub fn from_ordinal(value: i32) -> Option<Self> {
        usize::try_from(value).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub const fn name(self) -> &'static str {
        match self {
            CoordinateSystem::Unspecified => "unspecified",
            CoordinateSystem::LeftHandedXUp => "left_handed_xup",
            CoordinateSystem::LeftHandedYUp => "left_handed_yup",
            CoordinateSystem::LeftHandedZUp => "left_handed_zup",
            CoordinateSystem::RightHandedXUp => "right_handed_xup",
            CoordinateSystem::RightHandedYUp => "right_handed_yup",
            CoordinateSystem::RightHandedZUp => "right_handed_zup",
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Axis-aligned box around every written position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl ParticleWriterBuilder {
    pub fn set_distance_unit(&mut self, unit: DistanceUnit) -> Result<()> {
        self.add_metadata(DISTANCE_UNIT, &[unit as i32])
    }

    pub fn set_coordinate_system(&mut self, system: CoordinateSystem) -> Result<()> {
        self.add_metadata(COORDINATE_SYSTEM, &[system as i32])
    }

    /// Store the frame rate as a fraction, e.g. 30000/1001
    pub fn set_frame_rate(&mut self, numerator: u32, denominator: u32) -> Result<()> {
        self.add_metadata(FRAME_RATE, &[numerator, denominator])
    }
}

impl<R: Read + Seek> ParticleReader<R> {
    /// Distance unit of the file
    ///
    /// An absent entry means unitless. `None` if the entry exists but is
    /// not a single known int32 value.
    pub fn distance_unit(&self) -> Option<DistanceUnit> {
        match self.metadata_value(DISTANCE_UNIT) {
            None => Some(DistanceUnit::Unitless),
            Some(value) => DistanceUnit::from_ordinal(value.get_scalar::<i32>().ok()?),
        }
    }

    /// Coordinate system of the file
    ///
    /// An absent entry means unspecified. `None` if the entry exists but is
    /// not a single known int32 value.
    pub fn coordinate_system(&self) -> Option<CoordinateSystem> {
        match self.metadata_value(COORDINATE_SYSTEM) {
            None => Some(CoordinateSystem::Unspecified),
            Some(value) => CoordinateSystem::from_ordinal(value.get_scalar::<i32>().ok()?),
        }
    }

    /// Frame rate as (numerator, denominator)
    pub fn frame_rate(&self) -> Option<(u32, u32)> {
        let [numerator, denominator] = self
            .metadata_value(FRAME_RATE)?
            .get_array::<u32, 2>()
            .ok()?;
        Some((numerator, denominator))
    }

    /// Bounding box of the positions in the file
    ///
    /// `None` when the file has no box or the box was never filled in,
    /// which is the case for files without particles.
    pub fn bound_box(&self) -> Option<BoundBox> {
        let values = self
            .metadata_value(BOUND_BOX)?
            .get_array::<f32, 6>()
            .ok()?;
        if values.iter().any(|v| v.is_nan()) {
            return None;
        }
        let [x0, y0, z0, x1, y1, z1] = values;
        Some(BoundBox {
            min: [x0, y0, z0],
            max: [x1, y1, z1],
        })
    }
}
