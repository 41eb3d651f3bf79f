pub mod card_packs;
pub mod game_flow;
