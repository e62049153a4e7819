//! Name generation for hiring candidates.

use rand::Rng;

/// Generate a random display name, e.g. `"Priya 'Backprop' Okafor"`.
pub fn generate_name(rng: &mut impl Rng) -> String {
    let given = GIVEN_NAMES[rng.gen_range(0..GIVEN_NAMES.len())];
    let handle = HANDLES[rng.gen_range(0..HANDLES.len())];
    let family = FAMILY_NAMES[rng.gen_range(0..FAMILY_NAMES.len())];
    format!("{} '{}' {}", given, handle, family)
}

static GIVEN_NAMES: &[&str] = &[
    "James", "Mary", "Wei", "Yuki", "Aisha", "Pavel", "Ingrid", "Carlos", "Fatima", "Kenji",
    "Olga", "Raj", "Amara", "Dmitri", "Elena", "Hassan", "Priya", "Sven", "Ming", "Akiko",
    "Omar", "Katya", "Diego", "Nadia", "Hiroshi", "Leila", "Zara", "Orion",
];

static HANDLES: &[&str] = &[
    "Backprop", "Tensor", "Dropout", "Epoch", "Kernel", "Gradient", "Softmax", "Overflow",
    "Sigmoid", "Batchnorm", "Segfault", "Attention", "Lambda", "Cache", "Shard",
];

static FAMILY_NAMES: &[&str] = &[
    "Smith", "Chen", "Tanaka", "Okafor", "Novak", "Garcia", "Patel", "Kim", "Ivanova",
    "Haddad", "Larsen", "Nguyen", "Silva", "Mensah", "Kowalski", "Rao", "Fischer", "Moreau",
];
