use lop::{
  DiagnosticCode, Graph, ModuleIdx, ModuleInput, ModuleSideEffects, NormalizedOptions, ResolvedId,
  SyntheticNamedExports,
};

fn build_graph(modules: Vec<ModuleInput>) -> Graph {
  let mut graph = Graph::new(NormalizedOptions::default());
  for module in modules {
    graph.add_module(module).unwrap();
  }
  graph.build().unwrap();
  graph
}

fn idx(graph: &Graph, id: &str) -> ModuleIdx {
  graph.module_idx(id).unwrap_or_else(|| panic!("unknown module {id}"))
}

fn export_included(graph: &mut Graph, id: &str, name: &str) -> bool {
  let module = idx(graph, id);
  let variable = graph
    .variable_for_export_name(module, &name.into())
    .unwrap()
    .unwrap_or_else(|| panic!("{id} does not export {name}"));
  graph.variables.is_included(variable)
}

fn relevant_ids(graph: &mut Graph, id: &str) -> Vec<String> {
  let module = idx(graph, id);
  let mut ids: Vec<String> = graph
    .dependencies_to_be_included(module)
    .unwrap()
    .into_iter()
    .map(|dep| graph.modules[dep].id().to_string())
    .collect();
  ids.sort();
  ids
}

#[test]
fn pure_import_keeps_only_used_bindings() {
  // S1: only `u` is observed, `v` must disappear.
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "export const u = 1;\nexport const v = 2;\n"),
    ModuleInput::entry("./b.js", "import { u } from './a.js';\nconsole.log(u);\n"),
  ]);

  assert!(export_included(&mut graph, "./a.js", "u"));
  assert!(!export_included(&mut graph, "./a.js", "v"));

  let rendered_a = graph.render_module(idx(&graph, "./a.js")).unwrap();
  assert_eq!(rendered_a, "export const u = 1;");

  let rendered_b = graph.render_module(idx(&graph, "./b.js")).unwrap();
  assert!(rendered_b.contains("import { u } from './a.js';"));
  assert!(rendered_b.contains("console.log(u);"));

  assert_eq!(relevant_ids(&mut graph, "./b.js"), vec!["./a.js"]);
}

#[test]
fn side_effect_module_statement_is_included() {
  // S2, first half: an impure dependency keeps its statements.
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "console.log(\"hi\");\n")
      .with_side_effects(ModuleSideEffects::Analyzed(true)),
    ModuleInput::entry("./b.js", "import './a.js';\n"),
  ]);

  let a = idx(&graph, "./a.js");
  let rendered = graph.render_module(a).unwrap();
  assert!(rendered.contains("console.log"));
  assert_eq!(relevant_ids(&mut graph, "./b.js"), vec!["./a.js"]);
}

#[test]
fn pure_flagged_module_is_dropped_but_still_reports_effects() {
  // S2, second half: flagged pure, the statement is not emitted, yet the
  // latent effect is still reported by the raw analysis.
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "console.log(\"hi\");\n")
      .with_side_effects(ModuleSideEffects::UserDefined(false)),
    ModuleInput::entry("./b.js", "import './a.js';\n"),
  ]);

  let a = idx(&graph, "./a.js");
  assert_eq!(graph.render_module(a).unwrap(), "");
  assert!(graph.module_has_effects(a));
}

#[test]
fn reexport_relay_contributes_no_statements() {
  // S3: the relay module only forwards a binding.
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "export const x = 1;\n"),
    ModuleInput::new("./b.js", "export { x } from './a.js';\n"),
    ModuleInput::entry("./c.js", "import { x } from './b.js';\nconsole.log(x);\n"),
  ]);

  assert!(export_included(&mut graph, "./a.js", "x"));
  assert_eq!(relevant_ids(&mut graph, "./c.js"), vec!["./a.js"]);
}

#[test]
fn circular_reexport_is_fatal() {
  // S4: both sides re-export `x` from each other.
  let mut graph = Graph::new(NormalizedOptions::default());
  graph
    .add_module(ModuleInput::new("./a.js", "export { x } from './b.js';\n"))
    .unwrap();
  graph
    .add_module(ModuleInput::new("./b.js", "export { x } from './a.js';\n"))
    .unwrap();
  graph
    .add_module(ModuleInput::entry(
      "./c.js",
      "import { x } from './a.js';\nconsole.log(x);\n",
    ))
    .unwrap();

  let errors = graph.build().unwrap_err();
  let diagnostic = errors
    .iter()
    .find_map(|error| error.downcast_ref::<lop::Diagnostic>())
    .expect("expected a structured diagnostic");
  assert_eq!(diagnostic.code, DiagnosticCode::CircularReexport);
  assert!(diagnostic.message.contains("\"x\""));
  assert!(diagnostic.message.contains("./b.js"));
}

#[test]
fn star_reexport_conflict_resolves_to_nothing_with_warning() {
  // S5: two `export *` sources expose the same internal name.
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "export const k = 1;\n"),
    ModuleInput::new("./b.js", "export const k = 2;\n"),
    ModuleInput::new("./m.js", "export * from './a.js';\nexport * from './b.js';\n"),
    ModuleInput::entry("./main.js", "import './m.js';\n"),
  ]);

  let m = idx(&graph, "./m.js");
  let resolved = graph.variable_for_export_name(m, &"k".into()).unwrap();
  assert!(resolved.is_none());
  assert!(graph
    .warnings
    .iter()
    .any(|warning| warning.code == DiagnosticCode::NamespaceConflict));
}

#[test]
fn star_reexport_prefers_internal_over_external() {
  // S5, second half: internal beats external, no conflict warning.
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "export const k = 1;\n"),
    ModuleInput::new(
      "./m.js",
      "export * from './a.js';\nexport * from 'ext';\n",
    )
    .with_resolved("ext", ResolvedId::external("ext")),
    ModuleInput::entry("./main.js", "import './m.js';\n"),
  ]);

  let m = idx(&graph, "./m.js");
  let a = idx(&graph, "./a.js");
  let resolved = graph.variable_for_export_name(m, &"k".into()).unwrap().unwrap();
  assert_eq!(resolved.owner, a);
  assert!(!graph
    .warnings
    .iter()
    .any(|warning| warning.code == DiagnosticCode::NamespaceConflict));
}

#[test]
fn dynamic_import_preserves_full_namespace() {
  // S6: `import()` keeps every export of the target alive.
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "export const v = 1;\nexport const w = 2;\n"),
    ModuleInput::entry(
      "./b.js",
      "import('./a.js').then(ns => use(ns.v));\n",
    ),
  ]);

  assert!(export_included(&mut graph, "./a.js", "v"));
  assert!(export_included(&mut graph, "./a.js", "w"));

  let b = idx(&graph, "./b.js");
  let info = graph.module_info(b);
  assert_eq!(
    info.dynamically_imported_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
    vec!["./a.js"]
  );
}

#[test]
fn entry_exports_are_preserved() {
  // Law 2: every entry export resolves to an included variable.
  let mut graph = build_graph(vec![
    ModuleInput::new("./dep.js", "export const inner = 1;\n"),
    ModuleInput::entry(
      "./main.js",
      "export const a = 1;\nexport { inner } from './dep.js';\nexport default function main() {}\n",
    ),
  ]);

  for name in ["a", "inner", "default"] {
    assert!(export_included(&mut graph, "./main.js", name), "export {name} must be included");
  }
}

#[test]
fn no_treeshake_module_is_kept_whole() {
  // Law 3: `no-treeshake` forces statements and dependencies alike.
  let mut graph = build_graph(vec![
    ModuleInput::new("./used.js", "export const used = 1;\n"),
    ModuleInput::new(
      "./kept.js",
      "import { used } from './used.js';\nexport const a = used;\nconst unused = 2;\n",
    )
    .with_side_effects(ModuleSideEffects::NoTreeshake),
    ModuleInput::entry("./main.js", "import './kept.js';\n"),
  ]);

  let kept = idx(&graph, "./kept.js");
  let rendered = graph.render_module(kept).unwrap();
  assert!(rendered.contains("const unused = 2;"));
  assert_eq!(relevant_ids(&mut graph, "./kept.js"), vec!["./used.js"]);
}

#[test]
fn default_export_alias_chains_to_original() {
  // Law 7: tracing through `export default foo` reaches foo's binding.
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "function foo() {}\nexport default foo;\n"),
    ModuleInput::entry(
      "./m.js",
      "import x from './a.js';\nexport { x };\nconsole.log(x);\n",
    ),
  ]);

  let a = idx(&graph, "./a.js");
  let m = idx(&graph, "./m.js");
  let traced = graph.variable_for_export_name(m, &"x".into()).unwrap().unwrap();
  let original = graph.variables.original_variable(traced);
  assert_eq!(original.owner, a);
  assert_eq!(graph.variables.name(original).as_str(), "foo");
}

#[test]
fn synthetic_named_exports_lose_to_real_reexports() {
  // Law 6: a real binding re-exported through a synthetic module wins over
  // the synthetic fallback.
  let mut graph = build_graph(vec![
    ModuleInput::new("./c.js", "export const x = 1;\n"),
    ModuleInput::new(
      "./a.js",
      "export default {};\nexport { x } from './c.js';\n",
    )
    .with_synthetic_named_exports(SyntheticNamedExports::Default),
    ModuleInput::new("./m.js", "export * from './a.js';\n"),
    ModuleInput::entry("./main.js", "import './m.js';\n"),
  ]);

  let c = idx(&graph, "./c.js");
  let m = idx(&graph, "./m.js");
  let resolved = graph.variable_for_export_name(m, &"x".into()).unwrap().unwrap();
  assert_eq!(resolved.owner, c);
}

#[test]
fn synthetic_named_exports_serve_unknown_names() {
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "export default { anything: 1 };\n")
      .with_synthetic_named_exports(SyntheticNamedExports::Default),
    ModuleInput::entry(
      "./main.js",
      "import { anything } from './a.js';\nconsole.log(anything);\n",
    ),
  ]);

  let a = idx(&graph, "./a.js");
  let resolved = graph.variable_for_export_name(a, &"anything".into()).unwrap().unwrap();
  assert!(matches!(
    graph.variables.get(resolved).kind,
    lop::VariableKind::SyntheticNamedExport(_)
  ));
  // Using the synthetic name pulls in its backing default export.
  assert!(export_included(&mut graph, "./a.js", "default"));
}

#[test]
fn missing_export_is_fatal_with_position() {
  let mut graph = Graph::new(NormalizedOptions::default());
  graph.add_module(ModuleInput::new("./a.js", "export const present = 1;\n")).unwrap();
  graph
    .add_module(ModuleInput::entry(
      "./b.js",
      "import { absent } from './a.js';\nconsole.log(absent);\n",
    ))
    .unwrap();

  let errors = graph.build().unwrap_err();
  let diagnostic = errors
    .iter()
    .find_map(|error| error.downcast_ref::<lop::Diagnostic>())
    .expect("expected a structured diagnostic");
  assert_eq!(diagnostic.code, DiagnosticCode::MissingExport);
  assert_eq!(diagnostic.id.as_deref(), Some("./b.js"));
  assert!(diagnostic.loc.is_some());
}

#[test]
fn parse_errors_carry_offsets_and_plugin_hint() {
  let mut graph = Graph::new(NormalizedOptions::default());
  let error = graph
    .add_module(ModuleInput::entry("./styles.css", ".cls { color: red }\n"))
    .unwrap_err();
  let diagnostic = error
    .iter()
    .find_map(|error| error.downcast_ref::<lop::Diagnostic>())
    .expect("expected a structured diagnostic");
  assert_eq!(diagnostic.code, DiagnosticCode::ParseError);
  assert!(diagnostic.message.contains("plugins"));
  assert!(diagnostic.pos.is_some());
}

#[test]
fn shimmed_exports_warn_and_resolve() {
  let mut graph =
    Graph::new(NormalizedOptions { shim_missing_exports: true, ..NormalizedOptions::default() });
  graph.add_module(ModuleInput::new("./a.js", "export const present = 1;\n")).unwrap();
  graph
    .add_module(ModuleInput::entry(
      "./b.js",
      "import { absent } from './a.js';\nconsole.log(absent);\n",
    ))
    .unwrap();
  graph.build().unwrap();

  assert!(graph.warnings.iter().any(|warning| warning.code == DiagnosticCode::ShimmedExport));
  let a = graph.module_idx("./a.js").unwrap();
  let shim = graph.variable_for_export_name(a, &"absent".into()).unwrap().unwrap();
  assert!(matches!(graph.variables.get(shim).kind, lop::VariableKind::ExportShim));
}

#[test]
fn rendered_exports_reports_survivors() {
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "export const u = 1;\nexport const v = 2;\n"),
    ModuleInput::entry("./b.js", "import { u } from './a.js';\nconsole.log(u);\n"),
  ]);

  let a = idx(&graph, "./a.js");
  let rendered = graph.rendered_exports(a).unwrap();
  assert_eq!(
    rendered.rendered_exports.iter().map(|name| name.as_str()).collect::<Vec<_>>(),
    vec!["u"]
  );
  assert_eq!(
    rendered.removed_exports.iter().map(|name| name.as_str()).collect::<Vec<_>>(),
    vec!["v"]
  );
}

#[test]
fn partial_declarations_render_included_declarators_only() {
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "export const u = 1, v = 2;\n"),
    ModuleInput::entry("./b.js", "import { u } from './a.js';\nconsole.log(u);\n"),
  ]);

  let a = idx(&graph, "./a.js");
  assert_eq!(graph.render_module(a).unwrap(), "export const u = 1;");
}

#[test]
fn cycles_share_tokens_and_execution_order_is_postorder() {
  let graph = build_graph(vec![
    ModuleInput::new("./a.js", "import './b.js';\nexport const a = 1;\n"),
    ModuleInput::new("./b.js", "import './a.js';\nexport const b = 2;\n"),
    ModuleInput::entry("./main.js", "import './a.js';\n"),
  ]);

  let a = idx(&graph, "./a.js");
  let b = idx(&graph, "./b.js");
  let main = idx(&graph, "./main.js");
  let a_cycles = &graph.normal_module(a).cycles;
  let b_cycles = &graph.normal_module(b).cycles;
  assert!(!a_cycles.is_empty());
  assert_eq!(a_cycles, b_cycles);
  // Dependencies exit the DFS before their importers.
  assert!(graph.modules[main].exec_order() > graph.modules[a].exec_order());
}

#[test]
fn star_as_reexport_resolves_to_the_target_namespace() {
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "export const x = 1;\n"),
    ModuleInput::new("./m.js", "export * as inner from './a.js';\n"),
    ModuleInput::entry(
      "./main.js",
      "import { inner } from './m.js';\nconsole.log(inner.x);\n",
    ),
  ]);

  let a = idx(&graph, "./a.js");
  let m = idx(&graph, "./m.js");
  let resolved = graph.variable_for_export_name(m, &"inner".into()).unwrap().unwrap();
  assert_eq!(resolved, graph.normal_module(a).namespace_variable);
  assert!(export_included(&mut graph, "./a.js", "x"));
}

#[test]
fn namespace_import_keeps_every_export() {
  let mut graph = build_graph(vec![
    ModuleInput::new("./a.js", "export const one = 1;\nexport const two = 2;\n"),
    ModuleInput::entry(
      "./b.js",
      "import * as ns from './a.js';\nconsole.log(ns.one);\n",
    ),
  ]);

  // Member-level narrowing is out of scope; a used namespace includes all.
  assert!(export_included(&mut graph, "./a.js", "one"));
  assert!(export_included(&mut graph, "./a.js", "two"));
  assert_eq!(relevant_ids(&mut graph, "./b.js"), vec!["./a.js"]);
}

#[test]
fn warnings_reach_the_injected_sink() {
  use std::{cell::RefCell, rc::Rc};

  let seen: Rc<RefCell<Vec<lop::DiagnosticCode>>> = Rc::default();
  let sink = seen.clone();
  let mut graph = Graph::new(NormalizedOptions::default())
    .with_warning_sink(Box::new(move |warning| sink.borrow_mut().push(warning.code)));
  graph.add_module(ModuleInput::new("./a.js", "export const k = 1;\n")).unwrap();
  graph.add_module(ModuleInput::new("./b.js", "export const k = 2;\n")).unwrap();
  graph
    .add_module(ModuleInput::new(
      "./m.js",
      "export * from './a.js';\nexport * from './b.js';\n",
    ))
    .unwrap();
  graph.add_module(ModuleInput::entry("./main.js", "import './m.js';\n")).unwrap();
  graph.build().unwrap();

  let m = idx(&graph, "./m.js");
  graph.variable_for_export_name(m, &"k".into()).unwrap();
  assert_eq!(seen.borrow().as_slice(), &[DiagnosticCode::NamespaceConflict]);
}

#[test]
fn context_parse_hook_replaces_the_default_parser() {
  fn refuse_everything(
    _code: &str,
  ) -> Result<lop_ecmascript::Program, lop_ecmascript::ParseError> {
    Err(lop_ecmascript::ParseError { message: "refused".to_string(), pos: 0 })
  }

  let mut graph = Graph::new(NormalizedOptions::default()).with_context_parse(refuse_everything);
  let error = graph.add_module(ModuleInput::entry("./a.js", "export const a = 1;\n")).unwrap_err();
  let diagnostic = error
    .iter()
    .find_map(|error| error.downcast_ref::<lop::Diagnostic>())
    .expect("expected a structured diagnostic");
  assert_eq!(diagnostic.code, DiagnosticCode::ParseError);
  assert!(diagnostic.message.contains("refused"));
}

#[test]
fn unused_side_effect_free_function_is_dropped() {
  let mut graph = build_graph(vec![ModuleInput::entry(
    "./main.js",
    "function used() { return 1; }\nfunction unused() { return 2; }\nexport const n = used();\n",
  )]);

  let main = idx(&graph, "./main.js");
  let rendered = graph.render_module(main).unwrap();
  assert!(rendered.contains("function used"));
  assert!(!rendered.contains("function unused"));
}
