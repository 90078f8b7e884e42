//! tabula_engine - Formula compiler, Rhai-backed evaluator and cell resolve loop.

pub mod builtins;
pub mod engine;

#[cfg(test)]
mod tests {
    use crate::engine::*;

    fn at(name: &str) -> CellRef {
        CellRef::parse(name).unwrap()
    }

    fn put(grid: &Grid, name: &str, input: &str) {
        let own = at(name);
        let cell = evaluate_input(input, &own, &mut GridOperands(grid));
        grid.insert(own, cell);
    }

    fn value_of(grid: &Grid, name: &str) -> Value {
        grid.get(&at(name)).unwrap().value.clone()
    }

    #[test]
    fn test_from_str_single_letter_columns() {
        let a1 = CellRef::from_str("A1").unwrap();
        assert_eq!(a1.row, 0);
        assert_eq!(a1.col, 0);

        let z1 = CellRef::from_str("Z1").unwrap();
        assert_eq!(z1.row, 0);
        assert_eq!(z1.col, 25);
    }

    #[test]
    fn test_from_str_multi_letter_columns() {
        assert_eq!(CellRef::from_str("AA1").unwrap().col, 26);
        assert_eq!(CellRef::from_str("AZ1").unwrap().col, 51);
        assert_eq!(CellRef::from_str("BA1").unwrap().col, 52);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        let lower = CellRef::from_str("a1").unwrap();
        assert_eq!(lower, CellRef::new(0, 0));

        let mixed = CellRef::from_str("aA1").unwrap();
        assert_eq!(mixed.col, 26);
    }

    #[test]
    fn test_from_str_invalid_inputs() {
        assert!(CellRef::from_str("").is_none());
        assert!(CellRef::from_str("123").is_none());
        assert!(CellRef::from_str("ABC").is_none());
        assert!(CellRef::from_str("A0").is_none());
        assert!(CellRef::from_str("1A").is_none());
        assert!(CellRef::from_str("A 1").is_none());
    }

    #[test]
    fn test_builtins_over_ranges() {
        let grid = Grid::new();
        put(&grid, "A1", "2");
        put(&grid, "A2", "4");
        put(&grid, "A3", "6");
        put(&grid, "B1", "=AVG(A1..A3)");
        put(&grid, "B2", "=MAX(A1..A3) - MIN(A1..A3)");
        put(&grid, "B3", "=IIF(SUM(A1..A3) > 10, \"big\", \"small\")");

        assert_eq!(value_of(&grid, "B1"), Value::Number(4.0));
        assert_eq!(value_of(&grid, "B2"), Value::Number(4.0));
        assert_eq!(value_of(&grid, "B3"), Value::Text("big".to_string()));
    }

    #[test]
    fn test_percent_and_constants() {
        let grid = Grid::new();
        put(&grid, "A1", "200");
        put(&grid, "B1", "=A1*15%");
        put(&grid, "C1", "=INT(TODEG(PI))");

        assert_eq!(value_of(&grid, "B1"), Value::Number(30.0));
        assert_eq!(value_of(&grid, "C1"), Value::Number(180.0));
    }

    #[test]
    fn test_parameter_count_error() {
        let grid = Grid::new();
        put(&grid, "A1", "=SUM(1)");
        let cell = grid.get(&at("A1")).unwrap();
        assert_eq!(
            cell.error,
            Some(CellError::new(
                ErrorKind::ParameterCount,
                "SUM function requires 2 parameters or more"
            ))
        );
    }

    #[test]
    fn test_lowercase_references_resolve() {
        let grid = Grid::new();
        put(&grid, "A1", "3");
        put(&grid, "B1", "=a1 * a1");
        assert_eq!(value_of(&grid, "B1"), Value::Number(9.0));
        assert_eq!(grid.get(&at("B1")).unwrap().depends_on, vec![at("A1")]);
    }
}
