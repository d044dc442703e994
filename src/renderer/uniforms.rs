use bytemuck::{Pod, Zeroable};

use crate::sim::{GamePhase, GameState, HazardField, Level};

/// Per-frame tunnel shader uniforms (64 bytes, four vec4s)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TunnelUniforms {
    /// `[tunnel length, hurt (1 - health), draw distance, 0]`
    pub level: [f32; 4],
    /// `[player distance, time, draw hands (0/1), 0]`
    pub player: [f32; 4],
    /// Hand A `[angle, offset, hurt, 0]`
    pub hand_a: [f32; 4],
    /// Hand B `[angle, offset, hurt, 0]`
    pub hand_b: [f32; 4],
}

impl TunnelUniforms {
    pub fn from_state(state: &GameState, level: &Level) -> Self {
        let hand = |i: usize| {
            let s = state.player.hands[i].sample;
            [s.angle, s.offset, s.hurt, 0.0]
        };
        let draw_hands = if state.phase == GamePhase::Active { 1.0 } else { 0.0 };
        Self {
            level: [level.length(), 1.0 - state.player.health, state.draw_distance, 0.0],
            player: [state.player.distance, state.clock as f32, draw_hands, 0.0],
            hand_a: hand(0),
            hand_b: hand(1),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Hazard field laid out as a `buckets x 1` RGBA8 texture
#[derive(Debug, Clone, Copy)]
pub struct FieldTexture<'a> {
    pub width: u32,
    pub height: u32,
    pub bytes: &'a [u8],
}

impl<'a> FieldTexture<'a> {
    pub fn new(field: &'a HazardField) -> Self {
        Self {
            width: field.len() as u32,
            height: 1,
            bytes: field.as_bytes(),
        }
    }

    /// Bytes per texture row
    pub fn bytes_per_row(&self) -> u32 {
        self.width * crate::consts::FIELD_CHANNELS as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{BuildParams, LevelDescriptor, load_levels};

    #[test]
    fn test_uniform_block_is_four_vec4s() {
        assert_eq!(std::mem::size_of::<TunnelUniforms>(), 64);
    }

    #[test]
    fn test_uniforms_mirror_state() {
        let json = r#"[{"title": "U", "curve": [6, 2.0, 20.0], "song": {"duration": 5.0}, "defaultWidth": 48, "minWidth": 12}]"#;
        let descriptors = LevelDescriptor::parse_list(json).unwrap();
        let levels = load_levels(&descriptors, &BuildParams::default(), 3);
        let mut state = GameState::new();
        state.player.health = 0.25;
        state.player.distance = 12.0;
        state.draw_distance = 30.0;

        let uniforms = TunnelUniforms::from_state(&state, &levels[0]);
        assert_eq!(uniforms.level[0], levels[0].length());
        assert_eq!(uniforms.level[1], 0.75);
        assert_eq!(uniforms.level[2], 30.0);
        assert_eq!(uniforms.player[0], 12.0);
        assert_eq!(uniforms.player[2], 0.0);
        assert_eq!(uniforms.hand_a[1], crate::consts::MISS_OFFSET);
        assert_eq!(uniforms.as_bytes().len(), 64);
    }

    #[test]
    fn test_field_texture_layout() {
        let field = HazardField::default();
        let texture = FieldTexture::new(&field);
        assert_eq!(texture.width as usize, crate::consts::FIELD_BUCKETS);
        assert_eq!(texture.bytes.len() as u32, texture.bytes_per_row());
    }
}
