//! Mesh topology update after vertex removal

use maskcarve_core::{validate_faces, Carvable, Error, Face, Result, TriangleMesh};

/// Map every original vertex index to its index among the kept vertices.
///
/// The map is order preserving: kept vertices are numbered `0..kept_count` in
/// their original order. Removed vertices map to `None`.
pub fn index_remap(kept: &[bool]) -> Vec<Option<usize>> {
    let mut next = 0;
    kept.iter()
        .map(|&keep| {
            keep.then(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}

/// Keep the vertices flagged in `kept`, drop every face that references a
/// removed vertex, and rewrite the remaining faces into the new index space.
///
/// `kept` must have one flag per vertex. Faces are validated against the
/// original vertex count first.
pub fn update_topology<V: Carvable>(vertices: &V, faces: &[Face], kept: &[bool]) -> Result<TriangleMesh<V>> {
    let vertex_count = vertices.point_count();
    if kept.len() != vertex_count {
        return Err(Error::InvalidData(format!(
            "{} keep flags for {} vertices",
            kept.len(),
            vertex_count
        )));
    }
    validate_faces(faces, vertex_count)?;

    let remap = index_remap(kept);
    let surviving: Vec<usize> = (0..vertex_count).filter(|&i| kept[i]).collect();

    let new_faces = faces
        .iter()
        .filter_map(|face| match (remap[face[0]], remap[face[1]], remap[face[2]]) {
            (Some(a), Some(b), Some(c)) => Some([a, b, c]),
            _ => None,
        })
        .collect();

    Ok(TriangleMesh::from_vertices_and_faces(vertices.gather(&surviving), new_faces))
}
