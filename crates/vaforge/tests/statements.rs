use proptest::prelude::*;
use vaforge::veriloga::task::{display, fclose, fopen, fstrobe};
use vaforge::{Direction, Event, If, Module, SimType, Statement, Value};

#[derive(Debug, Clone)]
enum Tree {
    Leaf(String),
    List(Vec<Tree>),
}

impl Tree {
    fn build(&self) -> Statement {
        match self {
            Tree::Leaf(text) => Statement::raw(text.clone()),
            Tree::List(items) => Statement::list(items.iter().map(Tree::build)),
        }
    }

    fn leaves(&self, out: &mut Vec<String>) {
        match self {
            Tree::Leaf(text) => out.push(text.clone()),
            Tree::List(items) => items.iter().for_each(|item| item.leaves(out)),
        }
    }
}

fn tree() -> impl Strategy<Value = Tree> {
    let leaf = "[a-z]{1,6} = [0-9]{1,3}".prop_map(Tree::Leaf);
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Tree::List)
    })
}

proptest! {
    #[test]
    fn test_nested_lists_render_leaves_in_order(items in prop::collection::vec(tree(), 0..5)) {
        let mut expected = Vec::new();
        items.iter().for_each(|item| item.leaves(&mut expected));

        let block = Statement::block("h", items.iter().map(Tree::build)).unwrap();
        let rendered = block.render(0);
        let lines: Vec<&str> = rendered
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|line| line.ends_with(';'))
            .map(|line| line.trim_end_matches(';'))
            .collect();
        match expected.len() {
            0 => prop_assert_eq!(rendered.as_str(), "h;\n"),
            1 => prop_assert!(!rendered.contains("begin")),
            _ => prop_assert!(rendered.starts_with("h begin\n") && rendered.ends_with("end\n")),
        }
        prop_assert_eq!(lines, expected);
    }
}

#[test]
fn test_variables_in_statements() {
    let mut m = Module::new("m").unwrap();
    let a = m.net("a", Direction::Input).unwrap();
    let level = m.var_named("level", 0.0).unwrap();
    let count = m.var_named("count", 0).unwrap();
    let armed = m.var_named("armed", false).unwrap();

    let stmt: Statement = If::new(
        &*armed & level.gt(a.v()),
        [count.inc(), armed.assign(false)],
    )
    .unwrap()
    .otherwise([count.dec()])
    .unwrap()
    .into();
    insta::assert_snapshot!(stmt.render(0), @r"
    if( ( armed )&&( ( level )>( V(a) ) ) ) begin
        count = count + 1;
        armed = 0;
    end
    else
        count = count - 1;
    ");
}

#[test]
fn test_file_tasks_in_final_step() {
    let mut m = Module::new("m").unwrap();
    let fd = m.var_named("fd", 0).unwrap();
    let x = m.var_named("x", 1.5).unwrap();
    let open = Statement::wait_event(
        Event::initial_step(&[SimType::Tran]),
        [fd.assign(fopen("out.txt"))],
    )
    .unwrap();
    let close = Statement::wait_event(
        Event::final_step(&[SimType::Tran]),
        [
            fstrobe(&fd, "x=%g", &[Value::from(&*x)]),
            fclose(&fd),
            display("done", &[]),
        ],
    )
    .unwrap();
    assert_eq!(
        open.render(0),
        "@( initial_step(\"tran\") )\n    fd = $fopen(\"out.txt\");\n"
    );
    assert_eq!(
        close.render(0),
        "@( final_step(\"tran\") ) begin\n    $fstrobe(fd, \"x=%g\", x);\n    $fclose(fd);\n    $display(\"done\");\nend\n"
    );
}
