//! PLY format support
//!
//! Vertices are read into a [`StructuredPointCloud`] whose schema mirrors the
//! file's vertex properties exactly (names, types and order), so a cloud can be
//! carved and written back without losing or reinterpreting any attribute.

use crate::error::{IoError, Result};
use log::{info, warn};
use maskcarve_core::{
    Face, FieldDef, PointSchema, ScalarKind, ScalarValue, StructuredMesh, StructuredPointCloud,
    TriangleMesh,
};
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// PLY body encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlyEncoding {
    Ascii,
    #[default]
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl From<Encoding> for PlyEncoding {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Ascii => PlyEncoding::Ascii,
            Encoding::BinaryLittleEndian => PlyEncoding::BinaryLittleEndian,
            Encoding::BinaryBigEndian => PlyEncoding::BinaryBigEndian,
        }
    }
}

impl From<PlyEncoding> for Encoding {
    fn from(encoding: PlyEncoding) -> Self {
        match encoding {
            PlyEncoding::Ascii => Encoding::Ascii,
            PlyEncoding::BinaryLittleEndian => Encoding::BinaryLittleEndian,
            PlyEncoding::BinaryBigEndian => Encoding::BinaryBigEndian,
        }
    }
}

/// A PLY file as loaded: the mesh plus what is needed to write it back alike
#[derive(Debug, Clone)]
pub struct PlyDocument {
    pub mesh: StructuredMesh,
    pub encoding: PlyEncoding,
    pub comments: Vec<String>,
}

/// Read a PLY file.
///
/// Every scalar vertex property becomes a schema field. Faces are read from the
/// `face` element if there is one; polygons are fan-triangulated.
pub fn read_ply<P: AsRef<Path>>(path: P) -> Result<PlyDocument> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(&mut reader)?;

    let vertex_def = ply
        .header
        .elements
        .get("vertex")
        .ok_or_else(|| IoError::ply("file has no vertex element"))?;
    let schema = Arc::new(schema_from_element(vertex_def)?);

    let empty = Vec::new();
    let vertex_elements = ply.payload.get("vertex").unwrap_or(&empty);
    let mut vertices = StructuredPointCloud::with_capacity(schema.clone(), vertex_elements.len());
    let mut values = Vec::with_capacity(schema.fields().len());
    for (index, element) in vertex_elements.iter().enumerate() {
        values.clear();
        for field in schema.fields() {
            let value = element
                .get(&field.name)
                .and_then(scalar_from_property)
                .ok_or_else(|| {
                    IoError::ply(format!("vertex {} has no scalar '{}'", index, field.name))
                })?;
            values.push(value);
        }
        vertices.push_values(&values)?;
    }

    let faces = match ply.payload.get("face") {
        Some(elements) => read_faces(elements)?,
        None => Vec::new(),
    };

    info!(
        "Read {} vertices ({} properties) and {} faces from {}",
        vertices.len(),
        schema.fields().len(),
        faces.len(),
        path.display()
    );

    Ok(PlyDocument {
        mesh: TriangleMesh::from_vertices_and_faces(vertices, faces),
        encoding: ply.header.encoding.into(),
        comments: ply.header.comments.clone(),
    })
}

/// Write a mesh (or, without faces, a point cloud) as PLY.
///
/// The vertex element carries the cloud's schema unchanged. A `face` element
/// with `vertex_indices` is written only if the mesh has faces.
///
/// Meshes with faces are always written as ASCII: the binary writer of
/// `ply-rs` emits the element count as every list's length, which corrupts
/// face lists.
pub fn write_ply<P: AsRef<Path>>(
    path: P,
    mesh: &StructuredMesh,
    encoding: PlyEncoding,
    comments: &[String],
) -> Result<()> {
    let path = path.as_ref();
    let encoding = if mesh.has_faces() && encoding != PlyEncoding::Ascii {
        warn!(
            "Writing {} as ASCII instead of {:?}: binary face lists are not supported",
            path.display(),
            encoding
        );
        PlyEncoding::Ascii
    } else {
        encoding
    };

    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = encoding.into();
    ply.header.comments = comments.to_vec();

    let cloud = &mesh.vertices;
    let schema = cloud.schema();

    let mut vertex_def = ElementDef::new("vertex".to_string());
    vertex_def.count = cloud.len();
    for field in schema.fields() {
        vertex_def.properties.add(PropertyDef::new(
            field.name.clone(),
            PropertyType::Scalar(scalar_type(field.kind)),
        ));
    }
    ply.header.elements.add(vertex_def);

    let mut vertices = Vec::with_capacity(cloud.len());
    for index in 0..cloud.len() {
        let mut element = DefaultElement::new();
        for (field, value) in schema.fields().iter().zip(cloud.values(index)) {
            element.insert(field.name.clone(), property_from_scalar(value));
        }
        vertices.push(element);
    }
    ply.payload.insert("vertex".to_string(), vertices);

    if mesh.has_faces() {
        let mut face_def = ElementDef::new("face".to_string());
        face_def.count = mesh.faces.len();
        face_def.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));
        ply.header.elements.add(face_def);

        let mut faces = Vec::with_capacity(mesh.faces.len());
        for face in &mesh.faces {
            let indices = face
                .iter()
                .map(|&i| {
                    i32::try_from(i).map_err(|_| IoError::ply(format!("vertex index {} exceeds int range", i)))
                })
                .collect::<Result<Vec<i32>>>()?;
            let mut element = DefaultElement::new();
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            faces.push(element);
        }
        ply.payload.insert("face".to_string(), faces);
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    Writer::new().write_ply(&mut writer, &mut ply)?;
    writer.flush()?;

    info!(
        "Wrote {} vertices and {} faces to {}",
        cloud.len(),
        mesh.faces.len(),
        path.display()
    );
    Ok(())
}

fn schema_from_element(element: &ElementDef) -> Result<PointSchema> {
    let mut fields = Vec::with_capacity(element.properties.len());
    for property in element.properties.values() {
        match property.data_type {
            PropertyType::Scalar(ref scalar) => {
                fields.push(FieldDef::new(property.name.clone(), scalar_kind(scalar)));
            }
            PropertyType::List(..) => {
                return Err(IoError::ply(format!(
                    "list vertex property '{}' is not supported",
                    property.name
                )));
            }
        }
    }
    Ok(PointSchema::new(fields)?)
}

fn read_faces(elements: &[DefaultElement]) -> Result<Vec<Face>> {
    let mut faces = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let property = element
            .get("vertex_indices")
            .or_else(|| element.get("vertex_index"))
            .ok_or_else(|| IoError::ply(format!("face {} has no vertex_indices", index)))?;
        let indices = list_indices(property)
            .ok_or_else(|| IoError::ply(format!("face {} has non-integer indices", index)))?;

        if indices.len() < 3 {
            return Err(IoError::ply(format!(
                "face {} has only {} vertices",
                index,
                indices.len()
            )));
        }
        let mut resolved = Vec::with_capacity(indices.len());
        for raw in indices {
            let vertex = usize::try_from(raw)
                .map_err(|_| IoError::ply(format!("face {} has negative index {}", index, raw)))?;
            resolved.push(vertex);
        }
        for k in 1..resolved.len() - 1 {
            faces.push([resolved[0], resolved[k], resolved[k + 1]]);
        }
    }
    Ok(faces)
}

fn list_indices(property: &Property) -> Option<Vec<i64>> {
    let indices = match property {
        Property::ListChar(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListUChar(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListShort(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListUShort(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListInt(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListUInt(v) => v.iter().map(|&i| i as i64).collect(),
        _ => return None,
    };
    Some(indices)
}

fn scalar_kind(scalar: &ScalarType) -> ScalarKind {
    match scalar {
        ScalarType::Char => ScalarKind::Char,
        ScalarType::UChar => ScalarKind::UChar,
        ScalarType::Short => ScalarKind::Short,
        ScalarType::UShort => ScalarKind::UShort,
        ScalarType::Int => ScalarKind::Int,
        ScalarType::UInt => ScalarKind::UInt,
        ScalarType::Float => ScalarKind::Float,
        ScalarType::Double => ScalarKind::Double,
    }
}

fn scalar_type(kind: ScalarKind) -> ScalarType {
    match kind {
        ScalarKind::Char => ScalarType::Char,
        ScalarKind::UChar => ScalarType::UChar,
        ScalarKind::Short => ScalarType::Short,
        ScalarKind::UShort => ScalarType::UShort,
        ScalarKind::Int => ScalarType::Int,
        ScalarKind::UInt => ScalarType::UInt,
        ScalarKind::Float => ScalarType::Float,
        ScalarKind::Double => ScalarType::Double,
    }
}

fn scalar_from_property(property: &Property) -> Option<ScalarValue> {
    let value = match *property {
        Property::Char(v) => ScalarValue::Char(v),
        Property::UChar(v) => ScalarValue::UChar(v),
        Property::Short(v) => ScalarValue::Short(v),
        Property::UShort(v) => ScalarValue::UShort(v),
        Property::Int(v) => ScalarValue::Int(v),
        Property::UInt(v) => ScalarValue::UInt(v),
        Property::Float(v) => ScalarValue::Float(v),
        Property::Double(v) => ScalarValue::Double(v),
        _ => return None,
    };
    Some(value)
}

fn property_from_scalar(value: ScalarValue) -> Property {
    match value {
        ScalarValue::Char(v) => Property::Char(v),
        ScalarValue::UChar(v) => Property::UChar(v),
        ScalarValue::Short(v) => Property::Short(v),
        ScalarValue::UShort(v) => Property::UShort(v),
        ScalarValue::Int(v) => Property::Int(v),
        ScalarValue::UInt(v) => Property::UInt(v),
        ScalarValue::Float(v) => Property::Float(v),
        ScalarValue::Double(v) => Property::Double(v),
    }
}
