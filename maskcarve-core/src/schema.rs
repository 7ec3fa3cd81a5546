//! Point record schemas
//!
//! A [`PointSchema`] is the ordered list of named, typed attributes every record
//! of a [`StructuredPointCloud`](crate::StructuredPointCloud) carries. It is
//! resolved once: byte offsets and the location of `x`, `y` and `z` are computed
//! up front so that nothing downstream ever looks fields up by name per point.

use crate::point::ScalarKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One named attribute of a point record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: ScalarKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Resolved layout of a point record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointSchema {
    fields: Vec<FieldDef>,
    offsets: Vec<usize>,
    stride: usize,
    position: [usize; 3],
}

impl PointSchema {
    /// Resolve a schema from its ordered fields.
    ///
    /// Fails if a name repeats or if any of `x`, `y`, `z` is missing.
    pub fn new(fields: Vec<FieldDef>) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::Schema(format!("duplicate field '{}'", field.name)));
            }
        }

        let mut offsets = Vec::with_capacity(fields.len());
        let mut stride = 0;
        for field in &fields {
            offsets.push(stride);
            stride += field.kind.size();
        }

        let locate = |name: &str| {
            fields
                .iter()
                .position(|f| f.name == name)
                .ok_or_else(|| Error::Schema(format!("missing coordinate field '{}'", name)))
        };
        let position = [locate("x")?, locate("y")?, locate("z")?];

        Ok(Self {
            fields,
            offsets,
            stride,
            position,
        })
    }

    /// Schema with only `x`, `y`, `z` as `float`
    pub fn xyz_f32() -> Self {
        Self {
            fields: vec![
                FieldDef::new("x", ScalarKind::Float),
                FieldDef::new("y", ScalarKind::Float),
                FieldDef::new("z", ScalarKind::Float),
            ],
            offsets: vec![0, 4, 8],
            stride: 12,
            position: [0, 1, 2],
        }
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Size of one record in bytes
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Byte range of field `index` within a record
    pub fn field_range(&self, index: usize) -> std::ops::Range<usize> {
        let start = self.offsets[index];
        start..start + self.fields[index].kind.size()
    }

    /// Field indices of `x`, `y` and `z`
    pub fn position_fields(&self) -> [usize; 3] {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splat_fields() -> Vec<FieldDef> {
        vec![
            FieldDef::new("x", ScalarKind::Float),
            FieldDef::new("y", ScalarKind::Float),
            FieldDef::new("z", ScalarKind::Float),
            FieldDef::new("nx", ScalarKind::Float),
            FieldDef::new("red", ScalarKind::UChar),
            FieldDef::new("opacity", ScalarKind::Double),
        ]
    }

    #[test]
    fn test_offsets_and_stride() {
        let schema = PointSchema::new(splat_fields()).unwrap();
        assert_eq!(schema.stride(), 4 * 4 + 1 + 8);
        assert_eq!(schema.field_range(4), 16..17);
        assert_eq!(schema.field_range(5), 17..25);
        assert_eq!(schema.position_fields(), [0, 1, 2]);
        assert_eq!(schema.field_index("opacity"), Some(5));
    }

    #[test]
    fn test_coordinates_may_appear_anywhere() {
        let fields = vec![
            FieldDef::new("z", ScalarKind::Double),
            FieldDef::new("flag", ScalarKind::UChar),
            FieldDef::new("x", ScalarKind::Double),
            FieldDef::new("y", ScalarKind::Double),
        ];
        let schema = PointSchema::new(fields).unwrap();
        assert_eq!(schema.position_fields(), [2, 3, 0]);
    }

    #[test]
    fn test_rejects_bad_schemas() {
        let mut missing = splat_fields();
        missing.remove(1);
        assert!(matches!(PointSchema::new(missing), Err(Error::Schema(_))));

        let mut duplicate = splat_fields();
        duplicate.push(FieldDef::new("nx", ScalarKind::Float));
        assert!(matches!(PointSchema::new(duplicate), Err(Error::Schema(_))));
    }

    #[test]
    fn test_xyz_f32_matches_resolved_schema() {
        let resolved = PointSchema::new(vec![
            FieldDef::new("x", ScalarKind::Float),
            FieldDef::new("y", ScalarKind::Float),
            FieldDef::new("z", ScalarKind::Float),
        ])
        .unwrap();
        assert_eq!(PointSchema::xyz_f32(), resolved);
    }
}
