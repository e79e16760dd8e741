use crate::entity::Entity;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct EntityRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Relations")]
    pub relations: usize,
}

impl From<&Entity> for EntityRow {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id.clone(),
            kind: entity.kind.clone(),
            name: entity.name.clone(),
            path: entity.path.clone(),
            relations: entity.related.values().map(Vec::len).sum(),
        }
    }
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: impl ToString) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, String)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

pub fn entity_table(entities: &[Entity]) -> String {
    if entities.is_empty() {
        return String::new();
    }
    let rows: Vec<EntityRow> = entities.iter().map(EntityRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::RelationKind;

    #[test]
    fn test_entity_table_lists_every_entity() {
        let entities = vec![
            Entity::new("a").with_kind("struct").with_name("Alpha"),
            Entity::new("b").with_relation(RelationKind::Calls, "a"),
        ];

        let table = entity_table(&entities);
        assert!(table.contains("Alpha"));
        assert!(table.contains("Relations"));
        assert_eq!(entity_table(&[]), "");
    }

    #[test]
    fn test_stats_table() {
        let table = stats_table(&[("Entities", "3".to_string())]);
        assert!(table.contains("Entities"));
        assert!(table.contains('3'));
    }
}
