use itertools::Itertools;
use tracing::debug;

use crate::{
    animation::{decode_bone_channels, record_offset},
    binary_utils::fixed_string,
    editable::{
        EditableAnimation, EditableBlend, EditableEvent, EditablePivot, EditableSequence,
        EditableSequenceGroup,
    },
    format::{MotionFlags, NodeFlags, SequenceDesc, SequenceFlags},
    header::{to_usize, HeaderRef},
    loader::StudioData,
    settings::Settings,
    Error, FileType, Result,
};

use super::optional_index;

pub(crate) fn sequence_groups(header: &HeaderRef) -> Result<Vec<EditableSequenceGroup>> {
    Ok(header
        .sequence_groups()?
        .iter()
        .map(|group| EditableSequenceGroup {
            label: fixed_string(&group.label),
            file_name: fixed_string(&group.name),
        })
        .collect())
}

fn events(header: &HeaderRef, sequence: &SequenceDesc) -> Result<Vec<EditableEvent>> {
    Ok(header
        .events(sequence)?
        .iter()
        .map(|event| EditableEvent {
            frame: event.frame.get(),
            event: event.event.get(),
            options: fixed_string(&event.options),
        })
        .collect())
}

fn pivots(header: &HeaderRef, sequence: &SequenceDesc) -> Result<Vec<EditablePivot>> {
    Ok(header
        .pivots(sequence)?
        .iter()
        .map(|pivot| EditablePivot {
            origin: pivot.origin.get(),
            start: pivot.start.get(),
            end: pivot.end.get(),
        })
        .collect())
}

/// Buffer holding the animation data of sequences in `group`, `None` if that group isn't loaded.
fn animation_buffer<'a>(
    header: &HeaderRef<'a>,
    data: &'a StudioData,
    group: usize,
) -> Option<(&'a [u8], FileType)> {
    if group == 0 {
        return Some((header.bytes(), header.file_type()));
    }

    data.sequence_group(group)
        .map(|file| (file.bytes(), file.file_type()))
}

struct BlendLayout {
    animation_offset: usize,
    blend_count: usize,
    bone_count: usize,
    frame_count: usize,
}

fn blends(
    bytes: &[u8],
    layout: &BlendLayout,
    strict: bool,
    ty: FileType,
) -> Result<Vec<Vec<EditableAnimation>>> {
    (0..layout.blend_count)
        .map(|blend| {
            (0..layout.bone_count)
                .map(|bone| {
                    let offset = record_offset(blend, bone, layout.bone_count)
                        .and_then(|offset| offset.checked_add(layout.animation_offset))
                        .ok_or(Error::OutOfBounds {
                            ty,
                            section: "animation",
                        })?;

                    let values =
                        decode_bone_channels(bytes, offset, layout.frame_count, strict, ty)?;
                    Ok(EditableAnimation { values })
                })
                .try_collect()
        })
        .try_collect()
}

fn blend_data(sequence: &SequenceDesc) -> [EditableBlend; 2] {
    [0, 1].map(|i| EditableBlend {
        kind: MotionFlags::from_bits_retain(sequence.blend_type[i].get()),
        start: sequence.blend_start[i].get(),
        end: sequence.blend_end[i].get(),
    })
}

pub(crate) fn sequences(
    header: &HeaderRef,
    data: &StudioData,
    settings: &Settings,
) -> Result<Vec<EditableSequence>> {
    let ty = header.file_type();
    let bone_count = header.bones()?.len();

    header
        .sequences()?
        .iter()
        .map(|sequence| {
            let label = fixed_string(&sequence.label);
            let frame_count = to_usize(sequence.frame_count, ty, "sequence frames")?;
            let sequence_group =
                usize::try_from(sequence.sequence_group.get()).map_err(|_| Error::Corrupted {
                    ty,
                    error: "negative sequence group",
                })?;

            let blends = if settings.decodes_animations() {
                if let Some((bytes, animation_ty)) = animation_buffer(header, data, sequence_group)
                {
                    let layout = BlendLayout {
                        animation_offset: to_usize(
                            sequence.animation_offset,
                            animation_ty,
                            "animation",
                        )?,
                        blend_count: to_usize(sequence.blend_count, ty, "sequence blends")?,
                        bone_count,
                        frame_count,
                    };
                    blends(bytes, &layout, settings.is_strict_animation(), animation_ty)?
                } else {
                    debug!(
                        "sequence `{label}` uses sequence group {sequence_group} which isn't loaded"
                    );
                    Vec::new()
                }
            } else {
                Vec::new()
            };

            Ok(EditableSequence {
                fps: sequence.fps.get(),
                flags: SequenceFlags::from_bits_retain(sequence.flags.get()),
                activity: sequence.activity.get(),
                activity_weight: sequence.activity_weight.get(),
                events: events(header, sequence)?,
                pivots: pivots(header, sequence)?,
                frame_count,
                motion_type: MotionFlags::from_bits_retain(sequence.motion_type.get()),
                motion_bone: optional_index(sequence.motion_bone.get()),
                linear_movement: sequence.linear_movement.get(),
                bb_min: sequence.bb_min.get(),
                bb_max: sequence.bb_max.get(),
                blends,
                blend_data: blend_data(sequence),
                sequence_group,
                entry_node: sequence.entry_node.get(),
                exit_node: sequence.exit_node.get(),
                node_flags: NodeFlags::from_bits_retain(sequence.node_flags.get()),
                label,
            })
        })
        .try_collect()
}

pub(crate) fn transitions(header: &HeaderRef) -> Result<Vec<Vec<u8>>> {
    let transitions = header.transitions()?;
    let count = to_usize(header.raw().transition_count, header.file_type(), "transitions")?;

    Ok(transitions
        .chunks_exact(count.max(1))
        .map(<[u8]>::to_vec)
        .collect())
}

#[cfg(test)]
mod tests {
    use zerocopy::{AsBytes, FromBytes};

    use crate::{
        binary_utils::parse,
        fixture::{main_header, name, sequence_group_header, FileBuilder},
        format::{Animation, Bone, Event, F32Le, Header, Pivot, Vec3Le},
        loader::{MainFile, SequenceGroupFile},
    };

    use super::*;

    /// Animation block for `bone_count` bones with channel 0 of every bone animated
    /// by one literal run of `frames` frames holding `value + bone`.
    fn animation_block(builder: &mut FileBuilder, bone_count: usize, frames: u8, value: i16) -> i32 {
        let record_size = std::mem::size_of::<Animation>();
        let block_size = record_size * bone_count;
        let mut block = vec![0u8; block_size];
        let mut streams = Vec::new();

        for bone in 0..bone_count {
            let stream_offset = block_size + streams.len() - record_size * bone;
            let mut record = Animation::new_zeroed();
            record.offset[0].set(u16::try_from(stream_offset).unwrap());
            block[record_size * bone..record_size * (bone + 1)].copy_from_slice(record.as_bytes());

            streams.extend_from_slice(&[1, frames]);
            streams.extend_from_slice(&(value + bone as i16).to_le_bytes());
        }

        block.extend(streams);
        builder.push(&block[..])
    }

    fn skeleton(builder: &mut FileBuilder, header: &mut Header, bone_count: usize) {
        let bones: Vec<Bone> = (0..bone_count)
            .map(|_| {
                let mut bone = Bone::new_zeroed();
                bone.parent.set(-1);
                bone
            })
            .collect();
        header.bone_count.set(bone_count as i32);
        header.bone_offset.set(builder.push(&bones[..]));
    }

    fn sequence(label: &str, group: i32, animation_offset: i32, frames: i32) -> SequenceDesc {
        let mut sequence = SequenceDesc::new_zeroed();
        sequence.label = name(label);
        sequence.fps = F32Le::new(30.0);
        sequence.flags.set(SequenceFlags::LOOPING.bits());
        sequence.frame_count.set(frames);
        sequence.blend_count.set(1);
        sequence.sequence_group.set(group);
        sequence.animation_offset.set(animation_offset);
        sequence.motion_bone.set(-1);
        sequence
    }

    fn convert(data: &StudioData) -> Result<Vec<EditableSequence>> {
        let header = data.main().header().unwrap();
        sequences(&header, data, &Settings::default())
    }

    #[test]
    fn sequence_groups_select_animation_buffer() {
        let mut group_builder = FileBuilder::new();
        let group_offset = animation_block(&mut group_builder, 2, 3, 100);
        let group = group_builder.finish(&sequence_group_header());

        let mut builder = FileBuilder::new();
        let mut header = main_header();
        skeleton(&mut builder, &mut header, 2);
        let main_offset = animation_block(&mut builder, 2, 3, -7);

        let sequences = [
            sequence("main", 0, main_offset, 3),
            sequence("second", 2, group_offset, 3),
            sequence("missing", 1, group_offset, 3),
        ];
        header.sequence_count.set(3);
        header.sequence_offset.set(builder.push(&sequences[..]));

        let main = MainFile::from_bytes(builder.finish(&header), FileType::Main).unwrap();
        let group = SequenceGroupFile::from_bytes(group, 2).unwrap();
        let data = StudioData::new("test.mdl", main, None, vec![None, Some(group)]);

        let sequences = convert(&data).unwrap();
        assert_eq!(sequences.len(), 3);

        assert!(sequences[0].is_looping());
        assert_eq!(sequences[0].blends[0][0].values[0], [-7, -7, -7]);
        assert_eq!(sequences[0].blends[0][1].values[0], [-6, -6, -6]);
        assert!(sequences[0].blends[0][1].values[1].is_empty());

        assert_eq!(sequences[1].sequence_group, 2);
        assert_eq!(sequences[1].blends[0][0].values[0], [100, 100, 100]);
        assert_eq!(sequences[1].blends[0][1].values[0], [101, 101, 101]);

        assert_eq!(sequences[2].label, "missing");
        assert_eq!(sequences[2].frame_count, 3);
        assert!(sequences[2].blends.is_empty());
    }

    #[test]
    fn negative_sequence_group_is_corrupted() {
        let mut builder = FileBuilder::new();
        let mut header = main_header();
        header.sequence_count.set(1);
        header.sequence_offset.set(builder.push(&sequence("bad", -1, 0, 1)));

        let main = MainFile::from_bytes(builder.finish(&header), FileType::Main).unwrap();
        let data = StudioData::new("test.mdl", main, None, Vec::new());

        assert_eq!(
            convert(&data).unwrap_err(),
            Error::Corrupted {
                ty: FileType::Main,
                error: "negative sequence group"
            }
        );
    }

    #[test]
    fn events_and_pivots() {
        let mut builder = FileBuilder::new();
        let mut header = main_header();

        let mut event = Event::new_zeroed();
        event.frame.set(2);
        event.event.set(5004);
        event.options = name("common/npc_step1.wav");
        let event_offset = builder.push(&event);

        let mut pivot = Pivot::new_zeroed();
        pivot.origin = Vec3Le::new(glam::Vec3::new(1.0, 2.0, 3.0));
        pivot.end.set(10);
        let pivot_offset = builder.push(&pivot);

        let mut walk = sequence("walk", 0, 0, 0);
        walk.blend_count.set(0);
        walk.event_count.set(1);
        walk.event_offset.set(event_offset);
        walk.pivot_count.set(1);
        walk.pivot_offset.set(pivot_offset);
        walk.motion_bone.set(0);
        header.sequence_count.set(1);
        header.sequence_offset.set(builder.push(&walk));

        let main = MainFile::from_bytes(builder.finish(&header), FileType::Main).unwrap();
        let data = StudioData::new("test.mdl", main, None, Vec::new());
        let sequences = convert(&data).unwrap();

        assert_eq!(
            sequences[0].events,
            [EditableEvent {
                frame: 2,
                event: 5004,
                options: "common/npc_step1.wav".to_owned()
            }]
        );
        assert_eq!(sequences[0].pivots[0].origin, glam::Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(sequences[0].pivots[0].end, 10);
        assert_eq!(sequences[0].motion_bone, Some(0));
    }

    #[test]
    fn transitions_are_reshaped_into_rows() {
        let mut builder = FileBuilder::new();
        let mut header = main_header();
        header.transition_count.set(3);
        header
            .transition_offset
            .set(builder.push(&[0u8, 1, 2, 3, 4, 5, 6, 7, 8][..]));
        header.sequence_group_count.set(1);
        let mut group = crate::format::SequenceGroup::new_zeroed();
        group.label = name("default");
        header.sequence_group_offset.set(builder.push(&group));
        let bytes = builder.finish(&header);

        let header = HeaderRef::new(parse(&bytes, 0).unwrap(), &bytes, FileType::Main);
        assert_eq!(
            transitions(&header).unwrap(),
            [vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]
        );
        assert_eq!(
            sequence_groups(&header).unwrap(),
            [EditableSequenceGroup {
                label: "default".to_owned(),
                file_name: String::new()
            }]
        );
    }
}
