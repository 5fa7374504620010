use lasso::{Spur, ThreadedRodeo};
use std::collections::HashMap;

pub mod diagnostic;
pub mod src;

pub type Symbol = Spur;
pub type Rodeo = ThreadedRodeo<Symbol, fxhash::FxBuildHasher>;
pub type Hasher = fxhash::FxBuildHasher;
pub type FastHashMap<K, V> = HashMap<K, V, Hasher>;

/// Creates an empty rodeo using the workspace hasher
pub fn new_rodeo() -> Rodeo { Rodeo::with_hasher(Hasher::default()) }
