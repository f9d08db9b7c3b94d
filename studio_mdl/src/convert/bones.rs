use itertools::Itertools;

use crate::{
    binary_utils::fixed_string,
    editable::{
        BoneAxes, EditableAttachment, EditableBone, EditableBoneController, EditableHitbox,
    },
    format::{Bone, MotionFlags, MOUTH_CONTROLLER_INDEX, VECTOR_COMPONENT_COUNT},
    header::HeaderRef,
    Error, Result,
};

use super::{optional_index, required_index};

fn axes(bone: &Bone, first: usize) -> BoneAxes {
    let channels = first..first + VECTOR_COMPONENT_COUNT;
    let mut axes = BoneAxes::default();

    for (axis, channel) in channels.enumerate() {
        axes.controllers[axis] = optional_index(bone.bone_controller[channel].get());
        axes.values[axis] = bone.value[channel].get();
        axes.scales[axis] = bone.scale[channel].get();
    }

    axes
}

pub(crate) fn bones(header: &HeaderRef) -> Result<Vec<EditableBone>> {
    let bones = header.bones()?;

    bones
        .iter()
        .map(|bone| {
            let parent = optional_index(bone.parent.get());
            if parent.map_or(false, |parent| parent >= bones.len()) {
                return Err(Error::Corrupted {
                    ty: header.file_type(),
                    error: "bone parent out of range",
                });
            }

            Ok(EditableBone {
                name: fixed_string(&bone.name),
                parent,
                translation: axes(bone, 0),
                rotation: axes(bone, VECTOR_COMPONENT_COUNT),
            })
        })
        .try_collect()
}

pub(crate) fn bone_controllers(header: &HeaderRef) -> Result<Vec<EditableBoneController>> {
    let bone_count = header.bones()?.len();
    let ty = header.file_type();

    header
        .bone_controllers()?
        .iter()
        .map(|controller| {
            Ok(EditableBoneController {
                bone: required_index(
                    controller.bone.get(),
                    bone_count,
                    ty,
                    "bone controller has no valid bone",
                )?,
                kind: MotionFlags::from_bits_retain(controller.kind.get()),
                start: controller.start.get(),
                end: controller.end.get(),
                index: required_index(
                    controller.index.get(),
                    MOUTH_CONTROLLER_INDEX + 1,
                    ty,
                    "bone controller has no valid index",
                )?,
            })
        })
        .try_collect()
}

pub(crate) fn hitboxes(header: &HeaderRef) -> Result<Vec<EditableHitbox>> {
    let bone_count = header.bones()?.len();
    let ty = header.file_type();

    header
        .hitboxes()?
        .iter()
        .map(|hitbox| {
            Ok(EditableHitbox {
                bone: required_index(
                    hitbox.bone.get(),
                    bone_count,
                    ty,
                    "hitbox has no valid bone",
                )?,
                group: hitbox.group.get(),
                bb_min: hitbox.bb_min.get(),
                bb_max: hitbox.bb_max.get(),
            })
        })
        .try_collect()
}

pub(crate) fn attachments(header: &HeaderRef) -> Result<Vec<EditableAttachment>> {
    let bone_count = header.bones()?.len();
    let ty = header.file_type();

    header
        .attachments()?
        .iter()
        .map(|attachment| {
            Ok(EditableAttachment {
                name: fixed_string(&attachment.name),
                bone: required_index(
                    attachment.bone.get(),
                    bone_count,
                    ty,
                    "attachment has no valid bone",
                )?,
                origin: attachment.origin.get(),
            })
        })
        .try_collect()
}
