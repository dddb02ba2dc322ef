//! Instruction text sent alongside the room photo.

use roomcraft_core::SelectedItem;
use roomcraft_core::transform::render_placement_instructions;

const CLEAN_ROOM_INSTRUCTION: &str = "Remove all furniture, appliances, decorations and clutter from this room photo. \
Keep the camera angle, framing, walls, floor, ceiling, windows, doors and lighting exactly as they are, \
so the result looks like the same room completely empty.";

/// Instruction for emptying a room.
pub fn clean_room_instruction() -> String {
    CLEAN_ROOM_INSTRUCTION.to_string()
}

/// Instruction for adding every item in a single pass.
///
/// Items are rendered as a numbered list in the order given.
pub fn furnish_room_instruction(items: &[SelectedItem]) -> String {
    format!(
        "Add the following items to this empty room in a single edit, following each placement note:\n\
         {}\n\
         Keep the room's perspective, lighting and architecture unchanged, and make every item look \
         naturally placed at a realistic scale.",
        render_placement_instructions(items)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_room_instruction_mentions_removal() {
        let instruction = clean_room_instruction();
        assert!(instruction.starts_with("Remove all furniture"));
    }

    #[test]
    fn test_furnish_room_instruction_lists_items_in_order() {
        let items = vec![
            SelectedItem::new("sofa", "Sofa", "against the left wall "),
            SelectedItem::new("rug", "Rug", "under the sofa"),
        ];
        let instruction = furnish_room_instruction(&items);

        assert!(instruction.contains("1. a Sofa: against the left wall\n2. a Rug: under the sofa"));
        let sofa = instruction.find("Sofa").unwrap();
        let rug = instruction.find("Rug").unwrap();
        assert!(sofa < rug);
    }
}
