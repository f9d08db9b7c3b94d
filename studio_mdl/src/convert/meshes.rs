use itertools::Itertools;

use crate::{
    binary_utils::{fixed_string, parse_mut, parse_slice_mut},
    editable::{
        EditableBodypart, EditableMesh, EditableMeshTriangleRun, EditableMeshVertex,
        EditableModel,
    },
    format::{I16Le, Model, TriangleVertex, Vec3Le},
    header::HeaderRef,
    Error, FileType, Result,
};

/// One strip or fan of a mesh's triangle command stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleCommandRun<'a> {
    pub is_strip: bool,
    pub vertices: &'a [TriangleVertex],
}

/// Splits a triangle command stream into runs, stopping at the zero command.
/// Also returns the number of bytes consumed, terminator included.
///
/// # Errors
///
/// Returns `Err` if the stream ends before the terminator.
pub fn parse_triangle_commands(
    bytes: &[u8],
    ty: FileType,
) -> Result<(Vec<TriangleCommandRun>, usize)> {
    let out_of_bounds = Error::OutOfBounds {
        ty,
        section: "triangle commands",
    };
    let mut runs = Vec::new();
    let mut stream = bytes;

    loop {
        let command = parse_mut::<I16Le>(&mut stream)
            .ok_or_else(|| out_of_bounds.clone())?
            .get();
        if command == 0 {
            break;
        }

        let vertices = parse_slice_mut(&mut stream, usize::from(command.unsigned_abs()))
            .ok_or_else(|| out_of_bounds.clone())?;
        runs.push(TriangleCommandRun {
            is_strip: command > 0,
            vertices,
        });
    }

    Ok((runs, bytes.len() - stream.len()))
}

/// Per model vertex and normal arrays the triangle commands index into.
struct ModelVertices<'a> {
    vertex_bones: &'a [u8],
    vertices: &'a [Vec3Le],
    normal_bones: &'a [u8],
    normals: &'a [Vec3Le],
    ty: FileType,
}

impl<'a> ModelVertices<'a> {
    fn new(header: &HeaderRef<'a>, model: &Model) -> Result<Self> {
        Ok(Self {
            vertex_bones: header.vertex_bones(model)?,
            vertices: header.vertices(model)?,
            normal_bones: header.normal_bones(model)?,
            normals: header.normals(model)?,
            ty: header.file_type(),
        })
    }

    fn vertex(&self, vertex: &TriangleVertex) -> Result<EditableMeshVertex> {
        let vertex_index = usize::try_from(vertex.vertex_index.get()).ok();
        let (vertex_bone, position) = vertex_index
            .and_then(|i| Some((*self.vertex_bones.get(i)?, self.vertices.get(i)?)))
            .ok_or(Error::Corrupted {
                ty: self.ty,
                error: "triangle vertex index out of range",
            })?;

        let normal_index = usize::try_from(vertex.normal_index.get()).ok();
        let (normal_bone, normal) = normal_index
            .and_then(|i| Some((*self.normal_bones.get(i)?, self.normals.get(i)?)))
            .ok_or(Error::Corrupted {
                ty: self.ty,
                error: "triangle normal index out of range",
            })?;

        Ok(EditableMeshVertex {
            vertex_bone: vertex_bone.into(),
            vertex: position.get(),
            normal_bone: normal_bone.into(),
            normal: normal.get(),
            s: vertex.s.get(),
            t: vertex.t.get(),
        })
    }
}

fn editable_model(header: &HeaderRef, model: &Model) -> Result<EditableModel> {
    let ty = header.file_type();
    let vertices = ModelVertices::new(header, model)?;

    let meshes = header
        .meshes(model)?
        .iter()
        .map(|mesh| {
            let (runs, _) = parse_triangle_commands(header.triangle_commands(mesh)?, ty)?;

            let triangles = runs
                .iter()
                .map(|run| {
                    Ok(EditableMeshTriangleRun {
                        vertices: run
                            .vertices
                            .iter()
                            .map(|vertex| vertices.vertex(vertex))
                            .try_collect()?,
                        is_strip: run.is_strip,
                    })
                })
                .try_collect::<_, _, Error>()?;

            Ok(EditableMesh {
                triangles,
                texture: usize::try_from(mesh.skin_reference.get()).map_err(|_| {
                    Error::Corrupted {
                        ty,
                        error: "negative mesh skin reference",
                    }
                })?,
            })
        })
        .try_collect::<_, _, Error>()?;

    Ok(EditableModel {
        name: fixed_string(&model.name),
        meshes,
    })
}

pub(crate) fn body_parts(header: &HeaderRef) -> Result<Vec<EditableBodypart>> {
    header
        .body_parts()?
        .iter()
        .map(|body_part| {
            Ok(EditableBodypart {
                name: fixed_string(&body_part.name),
                base: body_part.base.get(),
                models: header
                    .models(body_part)?
                    .iter()
                    .map(|model| editable_model(header, model))
                    .try_collect()?,
            })
        })
        .try_collect()
}
