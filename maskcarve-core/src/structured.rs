//! Structured point clouds with an arbitrary attribute schema
//!
//! Records live in one contiguous arena of fixed-stride, native-endian bytes.
//! Carving reads only the coordinate fields and copies whole records, so every
//! other attribute (normals, colors, spherical harmonics, opacity, ...) comes
//! out byte-for-byte identical.

use crate::point::ScalarValue;
use crate::schema::PointSchema;
use crate::traits::Carvable;
use crate::{Error, Result};
use nalgebra::Point3;
use std::sync::Arc;

/// Point cloud whose records follow a [`PointSchema`]
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredPointCloud {
    schema: Arc<PointSchema>,
    data: Vec<u8>,
}

impl StructuredPointCloud {
    /// Create an empty cloud
    pub fn new(schema: Arc<PointSchema>) -> Self {
        Self {
            schema,
            data: Vec::new(),
        }
    }

    /// Create an empty cloud with room for `capacity` records
    pub fn with_capacity(schema: Arc<PointSchema>, capacity: usize) -> Self {
        let data = Vec::with_capacity(capacity * schema.stride());
        Self { schema, data }
    }

    /// Wrap raw record bytes. The length must be a multiple of the stride.
    pub fn from_bytes(schema: Arc<PointSchema>, data: Vec<u8>) -> Result<Self> {
        if data.len() % schema.stride() != 0 {
            return Err(Error::InvalidData(format!(
                "{} bytes is not a whole number of {}-byte records",
                data.len(),
                schema.stride()
            )));
        }
        Ok(Self { schema, data })
    }

    /// Build an `x`, `y`, `z` float cloud from positions
    pub fn from_positions(positions: &[Point3<f32>]) -> Self {
        let mut cloud = Self::with_capacity(Arc::new(PointSchema::xyz_f32()), positions.len());
        for p in positions {
            cloud.data.extend_from_slice(bytemuck::cast_slice(p.coords.as_slice()));
        }
        cloud
    }

    pub fn schema(&self) -> &Arc<PointSchema> {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.schema.stride()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw bytes of record `index`
    pub fn record(&self, index: usize) -> &[u8] {
        let stride = self.schema.stride();
        &self.data[index * stride..(index + 1) * stride]
    }

    /// Iterate over raw records
    pub fn records(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(self.schema.stride())
    }

    /// The whole arena
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Append one raw record
    pub fn push_record(&mut self, record: &[u8]) -> Result<()> {
        if record.len() != self.schema.stride() {
            return Err(Error::InvalidData(format!(
                "record has {} bytes, schema stride is {}",
                record.len(),
                self.schema.stride()
            )));
        }
        self.data.extend_from_slice(record);
        Ok(())
    }

    /// Append one record given as values in schema order
    pub fn push_values(&mut self, values: &[ScalarValue]) -> Result<()> {
        let fields = self.schema.fields();
        if values.len() != fields.len() {
            return Err(Error::InvalidData(format!(
                "expected {} values, got {}",
                fields.len(),
                values.len()
            )));
        }
        if let Some((field, value)) = fields
            .iter()
            .zip(values)
            .find(|(field, value)| field.kind != value.kind())
        {
            return Err(Error::InvalidData(format!(
                "field '{}' is {:?}, got {:?}",
                field.name,
                field.kind,
                value.kind()
            )));
        }

        for value in values {
            value.encode_into(&mut self.data);
        }
        Ok(())
    }

    /// Value of field `field` (a schema index) in record `index`
    pub fn value(&self, index: usize, field: usize) -> ScalarValue {
        let kind = self.schema.fields()[field].kind;
        kind.decode(&self.record(index)[self.schema.field_range(field)])
    }

    /// All values of record `index`, in schema order
    pub fn values(&self, index: usize) -> Vec<ScalarValue> {
        (0..self.schema.fields().len())
            .map(|field| self.value(index, field))
            .collect()
    }

    /// Position of record `index`
    pub fn position(&self, index: usize) -> Point3<f64> {
        let [x, y, z] = self.schema.position_fields();
        Point3::new(
            self.value(index, x).as_f64(),
            self.value(index, y).as_f64(),
            self.value(index, z).as_f64(),
        )
    }
}

impl Carvable for StructuredPointCloud {
    fn point_count(&self) -> usize {
        self.len()
    }

    fn point_position(&self, index: usize) -> Point3<f64> {
        self.position(index)
    }

    fn gather(&self, indices: &[usize]) -> Self {
        let mut out = Self::with_capacity(self.schema.clone(), indices.len());
        for &index in indices {
            out.data.extend_from_slice(self.record(index));
        }
        out
    }
}
