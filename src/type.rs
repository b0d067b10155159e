use crate::ShapefileError;

/// The geometry type of a shape or of a whole store.
///
/// The discriminants are the type codes used by the shapefile format, so that a record or header
/// can be checked against the store with a plain integer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ShapeType {
    Null = 0,
    Point = 1,
    Arc = 3,
    Polygon = 5,
    MultiPoint = 8,
    PointZ = 11,
    ArcZ = 13,
    PolygonZ = 15,
    MultiPointZ = 18,
    PointM = 21,
    ArcM = 23,
    PolygonM = 25,
    MultiPointM = 28,
    MultiPatch = 31,
}

impl ShapeType {
    /// Parse a type code as found in a file header or record.
    pub fn from_code(code: i32) -> Result<Self, ShapefileError> {
        let result = match code {
            0 => ShapeType::Null,
            1 => ShapeType::Point,
            3 => ShapeType::Arc,
            5 => ShapeType::Polygon,
            8 => ShapeType::MultiPoint,
            11 => ShapeType::PointZ,
            13 => ShapeType::ArcZ,
            15 => ShapeType::PolygonZ,
            18 => ShapeType::MultiPointZ,
            21 => ShapeType::PointM,
            23 => ShapeType::ArcM,
            25 => ShapeType::PolygonM,
            28 => ShapeType::MultiPointM,
            31 => ShapeType::MultiPatch,
            t => {
                return Err(ShapefileError::Encoding(format!(
                    "Unexpected shape type {}.",
                    t
                )))
            }
        };
        Ok(result)
    }

    /// The type code written to disk.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Human readable name of this type.
    pub fn name(self) -> &'static str {
        match self {
            ShapeType::Null => "NullShape",
            ShapeType::Point => "Point",
            ShapeType::Arc => "Arc",
            ShapeType::Polygon => "Polygon",
            ShapeType::MultiPoint => "MultiPoint",
            ShapeType::PointZ => "PointZ",
            ShapeType::ArcZ => "ArcZ",
            ShapeType::PolygonZ => "PolygonZ",
            ShapeType::MultiPointZ => "MultiPointZ",
            ShapeType::PointM => "PointM",
            ShapeType::ArcM => "ArcM",
            ShapeType::PolygonM => "PolygonM",
            ShapeType::MultiPointM => "MultiPointM",
            ShapeType::MultiPatch => "MultiPatch",
        }
    }

    /// Name for a raw type code, `"UnknownShapeType"` if the code is not recognized.
    pub fn name_of_code(code: i32) -> &'static str {
        ShapeType::from_code(code)
            .map(ShapeType::name)
            .unwrap_or("UnknownShapeType")
    }

    /// Whether shapes of this type carry a Z value per vertex.
    pub fn has_z(self) -> bool {
        matches!(
            self,
            ShapeType::PointZ
                | ShapeType::ArcZ
                | ShapeType::PolygonZ
                | ShapeType::MultiPointZ
                | ShapeType::MultiPatch
        )
    }

    /// Whether shapes of this type carry an M value per vertex. All Z types also carry M.
    pub fn has_m(self) -> bool {
        self.has_z()
            || matches!(
                self,
                ShapeType::PointM | ShapeType::ArcM | ShapeType::PolygonM | ShapeType::MultiPointM
            )
    }

    /// Whether shapes of this type are made of parts.
    pub fn has_parts(self) -> bool {
        matches!(
            self,
            ShapeType::Arc
                | ShapeType::ArcZ
                | ShapeType::ArcM
                | ShapeType::Polygon
                | ShapeType::PolygonZ
                | ShapeType::PolygonM
                | ShapeType::MultiPatch
        )
    }

    /// Whether this is one of the single-vertex point types.
    pub fn is_point(self) -> bool {
        matches!(
            self,
            ShapeType::Point | ShapeType::PointZ | ShapeType::PointM
        )
    }

    /// Whether this is one of the multi-point types.
    pub fn is_multipoint(self) -> bool {
        matches!(
            self,
            ShapeType::MultiPoint | ShapeType::MultiPointZ | ShapeType::MultiPointM
        )
    }
}

/// The kind of a part. Only meaningful for [`ShapeType::MultiPatch`]; every other type uses
/// [`PartType::Ring`] for all of its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum PartType {
    TriStrip = 0,
    TriFan = 1,
    OuterRing = 2,
    InnerRing = 3,
    FirstRing = 4,
    #[default]
    Ring = 5,
}

impl PartType {
    /// Parse a part type code as found in a MultiPatch record.
    pub fn from_code(code: i32) -> Result<Self, ShapefileError> {
        let result = match code {
            0 => PartType::TriStrip,
            1 => PartType::TriFan,
            2 => PartType::OuterRing,
            3 => PartType::InnerRing,
            4 => PartType::FirstRing,
            5 => PartType::Ring,
            t => {
                return Err(ShapefileError::Encoding(format!(
                    "Unexpected part type {}.",
                    t
                )))
            }
        };
        Ok(result)
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            PartType::TriStrip => "TriangleStrip",
            PartType::TriFan => "TriangleFan",
            PartType::OuterRing => "OuterRing",
            PartType::InnerRing => "InnerRing",
            PartType::FirstRing => "FirstRing",
            PartType::Ring => "Ring",
        }
    }

    /// Name for a raw part type code, `"UnknownPartType"` if the code is not recognized.
    pub fn name_of_code(code: i32) -> &'static str {
        PartType::from_code(code)
            .map(PartType::name)
            .unwrap_or("UnknownPartType")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn type_codes_survive_parsing() {
        for code in [0, 1, 3, 5, 8, 11, 13, 15, 18, 21, 23, 25, 28, 31] {
            assert_eq!(ShapeType::from_code(code).unwrap().code(), code);
        }
        assert!(ShapeType::from_code(2).is_err());
    }

    #[test]
    fn unknown_codes_have_fallback_names() {
        assert_eq!(ShapeType::name_of_code(5), "Polygon");
        assert_eq!(ShapeType::name_of_code(99), "UnknownShapeType");
        assert_eq!(PartType::name_of_code(1), "TriangleFan");
        assert_eq!(PartType::name_of_code(-1), "UnknownPartType");
    }

    #[test]
    fn dimensional_variants() {
        assert!(ShapeType::PolygonZ.has_z());
        assert!(ShapeType::PolygonZ.has_m());
        assert!(!ShapeType::PolygonM.has_z());
        assert!(ShapeType::PolygonM.has_m());
        assert!(!ShapeType::Polygon.has_m());
        assert!(ShapeType::MultiPatch.has_parts());
        assert!(!ShapeType::MultiPointZ.has_parts());
    }
}
