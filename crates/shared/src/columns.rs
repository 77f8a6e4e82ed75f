#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
}

impl Column {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

// `COLUMNS` defines order; `id` stays out of it and is surfaced
// separately for row selection.
pub trait Projection {
    const COLUMNS: &'static [Column];

    fn id(&self) -> i64;

    fn cell(&self, key: &str) -> String;

    fn row(&self) -> Vec<String> {
        Self::COLUMNS
            .iter()
            .map(|column| self.cell(column.key))
            .collect()
    }
}

pub fn headers<T: Projection>() -> Vec<&'static str> {
    T::COLUMNS.iter().map(|column| column.label).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget {
        id: i64,
        name: String,
        grade: String,
    }

    impl Projection for Widget {
        const COLUMNS: &'static [Column] =
            &[Column::new("name", "Name"), Column::new("grade", "Grade")];

        fn id(&self) -> i64 {
            self.id
        }

        fn cell(&self, key: &str) -> String {
            match key {
                "name" => self.name.clone(),
                "grade" => self.grade.clone(),
                _ => String::new(),
            }
        }
    }

    #[test]
    fn row_follows_column_order() {
        let widget = Widget {
            id: 4,
            name: "crank".into(),
            grade: "A".into(),
        };
        assert_eq!(widget.row(), vec!["crank".to_string(), "A".to_string()]);
        assert_eq!(headers::<Widget>(), vec!["Name", "Grade"]);
    }

    #[test]
    fn id_is_not_a_column() {
        assert!(Widget::COLUMNS.iter().all(|column| column.key != "id"));
    }
}
