pub struct ExecutedMigration {
    pub name: String,
}

pub struct ExecutedMigrationList {
    pub(super) items: Vec<ExecutedMigration>,
}

impl ExecutedMigrationList {
    pub fn last(&self) -> Option<&ExecutedMigration> {
        self.items.last()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn has_migration(&self, name: &str) -> bool {
        self.items.iter().any(|m| m.name == name)
    }
}
