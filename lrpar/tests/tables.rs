use cfgrammar::{Language, TIdx};
use lrpar::{BuildError, IndentationError, ParserTables, ParserTablesBuilder, build_parser_tables};
use lrtable::{Action, StIdx};

/// Lex whitespace separated words, each of which must be exactly one token.
fn lex(tables: &ParserTables, input: &str) -> Vec<TIdx<u32>> {
    input
        .split_whitespace()
        .map(|w| match tables.lexical_tables.accepts_str(w) {
            Some(tok) => TIdx(tok as u32),
            None => panic!("'{w}' is not a token"),
        })
        .collect()
}

fn reduced(tables: &ParserTables, actions: &[Action<u32>]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|a| match *a {
            Action::Reduce(pidx) => Some(tables.grammar().pp_prod(pidx)),
            _ => None,
        })
        .collect()
}

/// Check that every shift, goto, and lexical transition leads to a real state, and that every
/// reduction names a real production.
fn check_tables(lang: &Language, tables: &ParserTables) {
    let st = &tables.syntax_tables;
    let grm = tables.grammar();
    let states_len = st.states_len();
    let mut accepts = 0;
    for stidx in (0..usize::from(states_len)).map(StIdx::from) {
        for tidx in grm.iter_tidxs() {
            match st.action(stidx, tidx) {
                Action::Shift(target) => assert!(target < states_len),
                Action::Reduce(pidx) => {
                    assert!(usize::from(pidx) < usize::from(grm.prods_len()));
                    if pidx == st.accept_prod() {
                        assert_eq!(tidx, grm.eof_token_idx());
                        accepts += 1;
                    }
                }
                Action::None => (),
            }
        }
        for ridx in grm.iter_rules() {
            if let Some(target) = st.goto(stidx, ridx) {
                assert!(target < states_len);
            }
        }
    }
    assert_eq!(accepts, 1);
    for c in st.conflicts() {
        assert_eq!(st.action(c.stidx, c.tidx), c.kept);
        assert_ne!(c.kept, c.discarded);
    }

    let fa = &tables.lexical_tables;
    assert!(fa.is_deterministic());
    for state in 0..fa.states_len() {
        for sym in 0..fa.symbols_len() {
            if let Some(next) = fa.step(state, sym) {
                assert!(next < fa.states_len());
            }
        }
        if let Some(tok) = fa.accepted(state) {
            assert!(tok < lang.tokens.len());
        }
    }
}

#[test]
fn anbn() {
    let lang = Language::new()
        .token("a", "a")
        .token("b", "b")
        .production("Start", &["S"])
        .production("S", &["a", "S", "b"])
        .production("S", &[]);
    let tables = build_parser_tables(&lang).unwrap();
    check_tables(&lang, &tables);
    let st = &tables.syntax_tables;

    let actions = st.drive(&lex(&tables, "a a b b")).unwrap();
    assert_eq!(
        actions.last(),
        Some(&Action::Reduce(st.accept_prod()))
    );
    assert!(st.drive(&lex(&tables, "")).is_ok());

    let err = st.drive(&lex(&tables, "a a b")).unwrap_err();
    assert_eq!(err.tidx, tables.grammar().eof_token_idx());
    assert_eq!(st.action(err.stidx, err.tidx), Action::None);
    assert!(st.conflicts().is_empty());
}

#[test]
fn expression_trace() {
    let lang = Language::new()
        .token("+", "\\+")
        .token("*", "\\*")
        .token("(", "\\(")
        .token(")", "\\)")
        .token("id", "[a-z]+")
        .production("S", &["E"])
        .production("E", &["E", "+", "T"])
        .production("E", &["T"])
        .production("T", &["T", "*", "F"])
        .production("T", &["F"])
        .production("F", &["(", "E", ")"])
        .production("F", &["id"]);
    let tables = build_parser_tables(&lang).unwrap();
    check_tables(&lang, &tables);
    assert!(tables.syntax_tables.conflicts().is_empty());

    let actions = tables
        .syntax_tables
        .drive(&lex(&tables, "x + y * z"))
        .unwrap();
    assert_eq!(
        reduced(&tables, &actions),
        [
            "F: 'id'",
            "T: F",
            "E: T",
            "F: 'id'",
            "T: F",
            "F: 'id'",
            "T: T '*' F",
            "E: E '+' T",
            "S: E",
            "ACCEPT: S"
        ]
    );

    let actions = tables
        .syntax_tables
        .drive(&lex(&tables, "( x + y ) * z"))
        .unwrap();
    let reduced = reduced(&tables, &actions);
    let pos = |p: &str| reduced.iter().position(|x| x == p).unwrap();
    assert!(pos("E: E '+' T") < pos("T: T '*' F"));

    assert!(tables.syntax_tables.drive(&lex(&tables, "x + * y")).is_err());
}

#[test]
fn earliest_token_wins() {
    let lang = Language::new()
        .token("T1", "x")
        .token("T2", "x")
        .token("ID", "[a-z]+")
        .production("S", &["T1"])
        .production("S", &["T2"])
        .production("S", &["ID"]);
    let tables = build_parser_tables(&lang).unwrap();
    assert_eq!(tables.lexical_tables.accepts_str("x"), Some(0));
    assert_eq!(tables.lexical_tables.accepts_str("xx"), Some(2));
}

#[test]
fn conflicts() {
    let lang = Language::new()
        .token("+", "\\+")
        .token("id", "[a-z]+")
        .production("S", &["E"])
        .production("E", &["E", "+", "E"])
        .production("E", &["id"]);

    let tables = ParserTablesBuilder::new().verbose(true).build(&lang).unwrap();
    check_tables(&lang, &tables);
    assert_eq!(tables.syntax_tables.shift_reduce, 1);
    assert_eq!(tables.syntax_tables.reduce_reduce, 0);
    // Shifting makes '+' right associative.
    let actions = tables
        .syntax_tables
        .drive(&lex(&tables, "a + b + c"))
        .unwrap();
    assert_eq!(
        reduced(&tables, &actions)[..4],
        ["E: 'id'", "E: 'id'", "E: 'id'", "E: E '+' E"]
    );

    match ParserTablesBuilder::new()
        .error_on_conflicts(true)
        .build(&lang)
    {
        Err(e @ BuildError::Conflicts { .. }) => assert_eq!(
            e.to_string(),
            "Grammar has 1 Shift/Reduce and 0 Reduce/Reduce conflicts"
        ),
        x => panic!("{:?}", x),
    }
}

#[test]
fn indentation() {
    let lang = Language::new()
        .token("NEWLINE", "\n[ ]*")
        .token("INDENT", "\n[ ]*")
        .token("DEDENT", "\n[ ]*")
        .token("ID", "[a-z]+")
        .token(":", ":")
        .production("Block", &["ID", ":", "NEWLINE", "INDENT", "Stmts", "DEDENT"])
        .production("Stmts", &["Stmts", "ID", "NEWLINE"])
        .production("Stmts", &["ID", "NEWLINE"]);
    let tables = build_parser_tables(&lang).unwrap();
    check_tables(&lang, &tables);
    let ind = tables.indentation;
    assert!(ind.is_sensitive);
    assert_eq!(ind.newline_token, Some(TIdx(0)));
    assert_eq!(ind.indent_token, Some(TIdx(1)));
    assert_eq!(ind.dedent_token, Some(TIdx(2)));
    // The runtime decides between NEWLINE, INDENT and DEDENT from the indentation it sees.
    assert_eq!(tables.lexical_tables.accepts_str("\n  "), Some(0));
    assert_eq!(tables.lexical_tables.accepts_str(""), None);

    let toks = [3, 4, 0, 1, 3, 0, 3, 0, 2].map(TIdx);
    assert!(tables.syntax_tables.drive(&toks).is_ok());

    let lang = Language::new()
        .token("NEWLINE", "\n")
        .token("INDENT", "")
        .token("DEDENT", "\n")
        .token("ID", "[a-z]+")
        .production("S", &["ID"]);
    match build_parser_tables(&lang) {
        Err(BuildError::Lex(e)) => assert_eq!(e.token, "INDENT"),
        x => panic!("{:?}", x),
    }

    let lang = Language::new()
        .token("INDENT", "\n")
        .token("NEWLINE", "\n")
        .token("ID", "[a-z]+")
        .production("S", &["ID"]);
    match build_parser_tables(&lang) {
        Err(BuildError::Indentation(IndentationError { missing })) => assert_eq!(missing, "DEDENT"),
        x => panic!("{:?}", x),
    }
}

#[test]
fn errors() {
    let lang = Language::new()
        .token("a", "a(")
        .production("S", &["a"]);
    match build_parser_tables(&lang) {
        Err(BuildError::Lex(e)) => assert_eq!(e.token, "a"),
        x => panic!("{:?}", x),
    }

    let lang = Language::new().token("a", "a").production("S", &["b"]);
    let err = build_parser_tables(&lang).unwrap_err();
    assert!(matches!(err, BuildError::Language(_)));
    assert_eq!(err.to_string(), "Unknown symbol 'b' in a production of 'S'");
}

#[test]
fn smaller_storage() {
    let lang = Language::new()
        .token("a", "a")
        .production("S", &["a", "a"]);
    let tables = ParserTablesBuilder::<u8>::new_with_storaget()
        .build(&lang)
        .unwrap();
    let a = TIdx(0u8);
    let actions = tables.syntax_tables.drive(&[a, a]).unwrap();
    assert_eq!(actions.len(), 4);
}

#[test]
fn tables_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ParserTables<u32>>();
}
