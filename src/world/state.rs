use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tracing::{trace, warn};

use super::WorldUpdate;
use crate::blocks::BlockState;
use crate::geom::{BlockPosition, Position};

const DEFAULT_HEALTH: f32 = 20.0;
const DEFAULT_FOOD: f32 = 20.0;

/// Upper bound on nodes visited by a single path search
const MAX_PATH_NODES: usize = 10_000;

const HORIZONTAL_NEIGHBOURS: [BlockPosition; 4] = [
    BlockPosition { x: -1, y: 0, z: 0 },
    BlockPosition { x: 0, y: 0, z: -1 },
    BlockPosition { x: 1, y: 0, z: 0 },
    BlockPosition { x: 0, y: 0, z: 1 },
];

/// The session's most recent view of the world
#[derive(Debug, Clone)]
pub struct WorldState {
    username: String,
    position: Position,
    yaw: f32,
    moving: bool,
    health: f32,
    food: f32,
    players: BTreeSet<String>,
    blocks: HashMap<BlockPosition, BlockState>,
}

impl WorldState {
    pub fn new(username: impl Into<String>) -> Self {
        let username = username.into();
        let mut players = BTreeSet::new();
        players.insert(username.clone());

        Self {
            username,
            position: Position::default(),
            yaw: 0.0,
            moving: false,
            health: DEFAULT_HEALTH,
            food: DEFAULT_FOOD,
            players,
            blocks: HashMap::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn food(&self) -> f32 {
        self.food
    }

    pub fn players(&self) -> &BTreeSet<String> {
        &self.players
    }

    /// Fold one update into the model.
    ///
    /// Chat carries no state and is ignored here.
    pub fn apply(&mut self, update: &WorldUpdate) {
        match update {
            WorldUpdate::HealthUpdated { health, food } => {
                self.health = *health;
                self.food = *food;
            }
            WorldUpdate::PlayerJoined { name } => {
                self.players.insert(name.clone());
            }
            WorldUpdate::PlayerLeft { name } => {
                if name == &self.username {
                    warn!("Server reported our own player leaving");
                }
                self.players.remove(name);
            }
            WorldUpdate::BlockChanged { position, state } => {
                trace!("Block at {} is now {:?}", position, state);
                self.blocks.insert(*position, *state);
            }
            WorldUpdate::PositionCorrected { position } => {
                self.position = *position;
            }
            WorldUpdate::TimeUpdate { .. } | WorldUpdate::ChatReceived(_) => {}
        }
    }

    pub fn teleport_to(&mut self, position: Position) {
        self.position = position;
    }

    pub fn set_yaw(&mut self, degrees: f32) {
        self.yaw = degrees;
    }

    pub fn set_moving(&mut self, moving: bool) {
        self.moving = moving;
    }

    pub fn block_state_at(&self, position: BlockPosition) -> Option<BlockState> {
        self.blocks.get(&position).copied()
    }

    pub fn find_block_ids_within(
        &self,
        block_id: u16,
        origin: BlockPosition,
        radius: i32,
    ) -> Vec<BlockPosition> {
        let mut found: Vec<BlockPosition> = self
            .blocks
            .iter()
            .filter(|(_, state)| state.id() == block_id)
            .map(|(pos, _)| *pos)
            .filter(|pos| {
                (pos.x - origin.x).abs() <= radius
                    && (pos.y - origin.y).abs() <= radius
                    && (pos.z - origin.z).abs() <= radius
            })
            .collect();

        found.sort_by_key(|pos| (pos.distance_squared(&origin), *pos));
        found
    }

    /// Breadth-first walk over standable cells.
    ///
    /// Stops once within Manhattan distance 1 of the destination. The returned
    /// path starts at `start`.
    pub fn find_path_to(
        &self,
        start: BlockPosition,
        destination: BlockPosition,
    ) -> Option<Vec<BlockPosition>> {
        let mut came_from: HashMap<BlockPosition, BlockPosition> = HashMap::new();
        let mut visited: HashSet<BlockPosition> = HashSet::new();
        let mut frontier = VecDeque::new();

        visited.insert(start);
        frontier.push_back(start);

        while let Some(current) = frontier.pop_front() {
            if current.manhattan_distance(&destination) < 2 {
                return Some(reconstruct_path(&came_from, current));
            }
            if visited.len() > MAX_PATH_NODES {
                break;
            }
            for next in self.walkable_neighbours(current) {
                if visited.insert(next) {
                    came_from.insert(next, current);
                    frontier.push_back(next);
                }
            }
        }

        None
    }

    fn is_passable(&self, position: BlockPosition) -> bool {
        self.block_state_at(position)
            .is_some_and(|state| state.is_passable())
    }

    fn walkable_neighbours(&self, from: BlockPosition) -> Vec<BlockPosition> {
        let mut result = Vec::new();

        for dir in HORIZONTAL_NEIGHBOURS {
            let target = from + dir;
            if !self.is_passable(target.up(1)) {
                continue;
            }
            if self.is_passable(target) {
                if !self.is_passable(target.down(1)) {
                    result.push(target);
                } else if !self.is_passable(target.down(2)) {
                    result.push(target.down(1));
                }
            } else if self.is_passable(target.up(2)) {
                result.push(target.up(1));
            }
        }

        result
    }
}

fn reconstruct_path(
    came_from: &HashMap<BlockPosition, BlockPosition>,
    end: BlockPosition,
) -> Vec<BlockPosition> {
    let mut path = vec![end];
    let mut current = end;
    while let Some(previous) = came_from.get(&current) {
        path.push(*previous);
        current = *previous;
    }
    path.reverse();
    path
}
