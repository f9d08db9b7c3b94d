use std::path::Path;

use glam::Vec3;
use tracing::debug;

use crate::{
    convert,
    format::{
        MotionFlags, NodeFlags, SequenceFlags, TextureFlags, ANIMATION_CHANNEL_COUNT,
        BLEND_DATA_COUNT, MOUTH_CONTROLLER_INDEX, VECTOR_COMPONENT_COUNT,
    },
    header::HeaderRef,
    image::IndexedImage,
    loader::StudioData,
    settings::Settings,
    Result,
};

/// Per axis animation parameters of a bone, for either translation or rotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneAxes {
    pub controllers: [Option<usize>; VECTOR_COMPONENT_COUNT],
    pub values: [f32; VECTOR_COMPONENT_COUNT],
    pub scales: [f32; VECTOR_COMPONENT_COUNT],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableBone {
    pub name: String,
    pub parent: Option<usize>,
    pub translation: BoneAxes,
    pub rotation: BoneAxes,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableBoneController {
    pub bone: usize,
    pub kind: MotionFlags,
    pub start: f32,
    pub end: f32,
    pub index: usize,
}

impl EditableBoneController {
    #[must_use]
    pub fn is_mouth(&self) -> bool {
        self.index == MOUTH_CONTROLLER_INDEX
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableHitbox {
    pub bone: usize,
    pub group: i32,
    pub bb_min: Vec3,
    pub bb_max: Vec3,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableSequenceGroup {
    pub label: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableEvent {
    pub frame: i32,
    pub event: i32,
    pub options: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditablePivot {
    pub origin: Vec3,
    pub start: i32,
    pub end: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableBlend {
    pub kind: MotionFlags,
    pub start: f32,
    pub end: f32,
}

/// Animation of one bone in one blend.
///
/// Channels 0..3 are translation, 3..6 rotation. An empty channel is constant and
/// uses the bone's value and scale instead of per frame samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableAnimation {
    pub values: [Vec<i16>; ANIMATION_CHANNEL_COUNT],
}

impl EditableAnimation {
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.values.iter().all(Vec::is_empty)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableSequence {
    pub label: String,
    pub fps: f32,
    pub flags: SequenceFlags,
    pub activity: i32,
    pub activity_weight: i32,
    pub events: Vec<EditableEvent>,
    pub pivots: Vec<EditablePivot>,
    pub frame_count: usize,
    pub motion_type: MotionFlags,
    pub motion_bone: Option<usize>,
    pub linear_movement: Vec3,
    pub bb_min: Vec3,
    pub bb_max: Vec3,
    /// `blends[blend][bone]`
    pub blends: Vec<Vec<EditableAnimation>>,
    pub blend_data: [EditableBlend; BLEND_DATA_COUNT],
    pub sequence_group: usize,
    pub entry_node: i32,
    pub exit_node: i32,
    pub node_flags: NodeFlags,
}

impl EditableSequence {
    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.flags.contains(SequenceFlags::LOOPING)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableAttachment {
    pub name: String,
    pub bone: usize,
    pub origin: Vec3,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableMeshVertex {
    pub vertex_bone: usize,
    pub vertex: Vec3,
    pub normal_bone: usize,
    pub normal: Vec3,
    pub s: i16,
    pub t: i16,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableMeshTriangleRun {
    pub vertices: Vec<EditableMeshVertex>,
    /// Strip if `true`, fan otherwise.
    pub is_strip: bool,
}

impl EditableMeshTriangleRun {
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.vertices.len().saturating_sub(2)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableMesh {
    pub triangles: Vec<EditableMeshTriangleRun>,
    /// Skin reference, resolved through a skin family.
    pub texture: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableModel {
    pub name: String,
    pub meshes: Vec<EditableMesh>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableBodypart {
    pub name: String,
    pub base: i32,
    pub models: Vec<EditableModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableTexture {
    pub name: String,
    pub flags: TextureFlags,
    pub image: IndexedImage,
}

/// Fully owned studio model, independent of the files it was read from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableStudioModel {
    pub eye_position: Vec3,
    pub hull_min: Vec3,
    pub hull_max: Vec3,
    pub bb_min: Vec3,
    pub bb_max: Vec3,
    pub flags: i32,

    pub bones: Vec<EditableBone>,
    pub bone_controllers: Vec<EditableBoneController>,
    pub hitboxes: Vec<EditableHitbox>,
    pub sequence_groups: Vec<EditableSequenceGroup>,
    pub sequences: Vec<EditableSequence>,
    pub attachments: Vec<EditableAttachment>,
    pub body_parts: Vec<EditableBodypart>,
    pub textures: Vec<EditableTexture>,
    /// `skin_families[family][skin_reference]` is a texture index.
    pub skin_families: Vec<Vec<i16>>,
    /// `transitions[from][to]`
    pub transitions: Vec<Vec<u8>>,
}

impl EditableStudioModel {
    /// Loads the model at `path` with its auxiliary files and converts it.
    ///
    /// # Errors
    ///
    /// Returns `Err` if loading any required file fails or any section is invalid.
    pub fn read(path: impl AsRef<Path>, settings: &Settings) -> Result<Self> {
        let data = StudioData::read(path)?;
        Self::from_studio_data(&data, settings)
    }

    /// # Errors
    ///
    /// Returns `Err` if any section is out of bounds or invalid.
    pub fn from_studio_data(data: &StudioData, settings: &Settings) -> Result<Self> {
        let header = data.main().header()?;
        let raw = header.raw();

        let mut model = Self {
            eye_position: header.eye_position(),
            hull_min: raw.hull_min.get(),
            hull_max: raw.hull_max.get(),
            bb_min: raw.bb_min.get(),
            bb_max: raw.bb_max.get(),
            flags: raw.flags.get(),

            bones: convert::bones(&header)?,
            bone_controllers: convert::bone_controllers(&header)?,
            hitboxes: convert::hitboxes(&header)?,
            sequence_groups: convert::sequence_groups(&header)?,
            sequences: convert::sequences(&header, data, settings)?,
            attachments: convert::attachments(&header)?,
            body_parts: convert::body_parts(&header)?,
            transitions: convert::transitions(&header)?,
            ..Self::default()
        };

        if let Some(texture_header) = texture_source(&header, data)? {
            let encoding = settings.texture_encoding_for(data.path());
            debug!(
                "reading textures from {} as {encoding:?}",
                texture_header.file_type()
            );

            model.textures = convert::textures(&texture_header, encoding)?;
            model.skin_families = convert::skin_families(&texture_header)?;
        }

        Ok(model)
    }
}

/// The main file holds textures if it has a texture section, otherwise the texture file does.
fn texture_source<'a>(
    main: &HeaderRef<'a>,
    data: &'a StudioData,
) -> Result<Option<HeaderRef<'a>>> {
    if main.raw().texture_offset.get() != 0 {
        return Ok(Some(*main));
    }

    match data.texture() {
        Some(texture) => texture.header().map(Some),
        None => {
            debug!("model has no texture data");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use zerocopy::FromBytes;

    use crate::{
        fixture::{main_header, name, FileBuilder},
        format::{
            Animation, Bone, Header, I16Le, SequenceDesc, Texture, Vec3Le,
            HYBRID_TEXTURE_NAME_SIZE, PALETTE_SIZE,
        },
        loader::MainFile,
        settings::TextureEncoding,
        FileType,
    };

    use super::*;

    fn one_bone_one_sequence() -> (Header, FileBuilder) {
        let mut builder = FileBuilder::new();
        let mut header = main_header();

        let mut bone = Bone::new_zeroed();
        bone.name = name("Bip01");
        bone.parent.set(-1);
        for controller in &mut bone.bone_controller {
            controller.set(-1);
        }
        header.bone_count.set(1);
        header.bone_offset.set(builder.push(&bone));

        let animation = Animation::new_zeroed();
        let animation_offset = builder.push(&animation);

        let mut sequence = SequenceDesc::new_zeroed();
        sequence.label = name("idle");
        sequence.frame_count.set(4);
        sequence.blend_count.set(1);
        sequence.animation_offset.set(animation_offset);
        header.sequence_count.set(1);
        header.sequence_offset.set(builder.push(&sequence));

        (header, builder)
    }

    fn load(bytes: Vec<u8>, path: &str, texture: Option<Vec<u8>>) -> StudioData {
        let main = MainFile::from_bytes(bytes, FileType::Main).unwrap();
        let texture = texture.map(|bytes| MainFile::from_bytes(bytes, FileType::Texture).unwrap());
        StudioData::new(path, main, texture, Vec::new())
    }

    #[test]
    fn constant_animation_end_to_end() {
        let (mut header, builder) = one_bone_one_sequence();
        header.eye_position = Vec3Le::new(Vec3::new(0.0, 0.0, 64.0));
        let data = load(builder.finish(&header), "test.mdl", None);

        let model = EditableStudioModel::from_studio_data(&data, &Settings::default()).unwrap();

        assert_relative_eq!(model.eye_position.z, 64.0);
        assert_eq!(model.bones.len(), 1);
        assert_eq!(model.bones[0].name, "Bip01");
        assert_eq!(model.bones[0].parent, None);
        assert_eq!(model.sequences.len(), 1);

        let sequence = &model.sequences[0];
        assert_eq!(sequence.label, "idle");
        assert_eq!(sequence.frame_count, 4);
        assert_eq!(sequence.blends.len(), 1);
        assert_eq!(sequence.blends[0].len(), 1);
        assert!(sequence.blends[0][0].values.iter().all(Vec::is_empty));
        assert!(sequence.blends[0][0].is_constant());

        assert!(model.textures.is_empty());
        assert!(model.skin_families.is_empty());
        assert!(model.body_parts.is_empty());
    }

    #[test]
    fn animations_can_be_skipped() {
        let (header, builder) = one_bone_one_sequence();
        let data = load(builder.finish(&header), "test.mdl", None);

        let mut settings = Settings::default();
        settings.decode_animations(false);
        let model = EditableStudioModel::from_studio_data(&data, &settings).unwrap();

        assert_eq!(model.sequences[0].frame_count, 4);
        assert!(model.sequences[0].blends.is_empty());
    }

    fn texture_file(width: i32, height: i32, pixels: &[u8], palette: &[u8]) -> Vec<u8> {
        let mut builder = FileBuilder::new();
        let mut header = main_header();

        let data_offset = builder.push(pixels);
        builder.push(palette);

        let mut texture = Texture::new_zeroed();
        texture.name = name("skin.bmp");
        texture.width.set(width);
        texture.height.set(height);
        texture.offset.set(data_offset);
        header.texture_count.set(1);
        header.texture_offset.set(builder.push(&texture));

        let skins: [I16Le; 2] = [I16Le::new(0), I16Le::new(0)];
        header.skin_reference_count.set(1);
        header.skin_family_count.set(2);
        header.skin_offset.set(builder.push(&skins[..]));

        builder.finish(&header)
    }

    #[test]
    fn textures_come_from_texture_file_when_main_has_none() {
        let (header, builder) = one_bone_one_sequence();
        let mut palette = vec![0; PALETTE_SIZE * 3];
        palette[3..6].copy_from_slice(&[10, 20, 30]);
        let texture = texture_file(2, 1, &[1, 0], &palette);

        let data = load(builder.finish(&header), "test.mdl", Some(texture));
        let model = EditableStudioModel::from_studio_data(&data, &Settings::default()).unwrap();

        assert_eq!(model.textures.len(), 1);
        let texture = &model.textures[0];
        assert_eq!(texture.name, "skin.bmp");
        assert_eq!(texture.image.width(), 2);
        assert_eq!(texture.image.pixels(), [1, 0]);
        assert_eq!(texture.image.palette()[1], rgb::RGB8::new(10, 20, 30));
        assert_eq!(model.skin_families, [vec![0], vec![0]]);
    }

    #[test]
    fn main_texture_section_wins_over_texture_file() {
        let mut palette = vec![0; PALETTE_SIZE * 3];
        palette[0..3].copy_from_slice(&[1, 1, 1]);
        let main = texture_file(1, 1, &[0], &palette);

        let mut other_palette = vec![0; PALETTE_SIZE * 3];
        other_palette[0..3].copy_from_slice(&[9, 9, 9]);
        let texture = texture_file(1, 1, &[0], &other_palette);

        let data = load(main, "test.mdl", Some(texture));
        let model = EditableStudioModel::from_studio_data(&data, &Settings::default()).unwrap();

        assert_eq!(model.textures.len(), 1);
        assert_eq!(
            model.textures[0].image.palette()[0],
            rgb::RGB8::new(1, 1, 1)
        );
    }

    #[test]
    fn dol_extension_selects_hybrid_textures() {
        let mut data = vec![0; HYBRID_TEXTURE_NAME_SIZE];
        let mut palette = vec![0; PALETTE_SIZE * 4];
        palette[16 * 4..17 * 4].copy_from_slice(&[70, 80, 90, 255]);
        data.extend(palette);
        let texture = texture_file(2, 1, &data, &[8, 3]);

        let (header, builder) = one_bone_one_sequence();
        let studio_data = load(builder.finish(&header), "models/test.DOL", Some(texture));
        let model =
            EditableStudioModel::from_studio_data(&studio_data, &Settings::default()).unwrap();

        let image = &model.textures[0].image;
        assert_eq!(image.pixels(), [16, 3]);
        assert_eq!(image.palette()[16], rgb::RGB8::new(70, 80, 90));

        let mut settings = Settings::default();
        settings.texture_encoding(Some(TextureEncoding::Indexed));
        let model = EditableStudioModel::from_studio_data(&studio_data, &settings).unwrap();
        assert_eq!(model.textures[0].image.pixels(), [0, 0]);
    }

    #[test]
    fn failing_section_aborts_assembly() {
        let (mut header, builder) = one_bone_one_sequence();
        header.hitbox_count.set(3);
        header.hitbox_offset.set(1 << 20);
        let data = load(builder.finish(&header), "test.mdl", None);

        let err = EditableStudioModel::from_studio_data(&data, &Settings::default()).unwrap_err();
        assert_eq!(
            err,
            crate::Error::OutOfBounds {
                ty: FileType::Main,
                section: "hitboxes"
            }
        );
    }
}
