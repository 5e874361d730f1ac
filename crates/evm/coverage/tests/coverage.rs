//! End-to-end exercise of the pipeline against a small, hand-built compiler
//! output and trace, mirroring the shapes an out-of-scope compiler/trace
//! collaborator would hand over.

use solcov_coverage::{CoverageOptions, CoverageReport, ContractIndex};
use solcov_coverage::artifacts::{CompilerOutput, Trace};

fn counter_sol_output() -> CompilerOutput {
    // Roughly:
    //   contract Counter {
    //       uint256 public number;        // [17, 39)
    //       function increment() public { // [43, 83)
    //           number++;                 // [74, 83) -- inside increment, AST id 10
    //       }
    //   }
    // Two operations in the runtime bytecode: one lands squarely on the
    // `number++` statement, one is a synthetic (file_index -1) dispatcher op.
    let json = r#"{
        "contracts": {
            "Counter.sol:Counter": {
                "srcmap-runtime": "74:9:0:-;0:0:-1:-",
                "bin-runtime": "0x6001600250"
            }
        },
        "sourceList": ["Counter.sol"],
        "sources": {
            "Counter.sol": {
                "AST": {
                    "id": 1,
                    "src": "0:120:0",
                    "children": [
                        {
                            "id": 9,
                            "src": "43:40:0",
                            "children": [
                                { "id": 10, "src": "74:9:0", "children": [] }
                            ]
                        }
                    ]
                }
            }
        }
    }"#;
    serde_json::from_str(json).unwrap()
}

#[test]
fn full_pipeline_attributes_hits_to_the_right_construct() {
    let output = counter_sol_output();
    let index = ContractIndex::build(&output).expect("index builds");
    let mut report = CoverageReport::from_compiler_output(&output).expect("locations build");

    // increment()'s only statement, `number++` at [74, 83), is a leaf and
    // is always emitted; its enclosing function node [43, 83) keeps a
    // nonzero residual too since the statement doesn't start at its offset.
    assert!(report.locations.contains_key("Counter.sol"));
    let before: u64 = report.locations["Counter.sol"].iter().map(|l| l.hits).sum();
    assert_eq!(before, 0);

    let trace: Trace =
        serde_json::from_str(r#"{ "code": "0x6001600250", "ops": [{ "pc": 0 }, { "pc": 2 }] }"#).unwrap();
    report.record_trace(&index, &trace, CoverageOptions { diagnostics: true }).expect("trace folds");

    let statement_hits = report.locations["Counter.sol"]
        .iter()
        .find(|l| l.coverage_range.byte_offset == 74 && l.coverage_range.byte_length == 9)
        .expect("statement location exists")
        .hits;
    assert_eq!(statement_hits, 1);

    // The second op (pc 2, the start of the second PUSH1) maps to the
    // synthetic dispatcher operation, which has no source file and is
    // silently skipped, not aggregated anywhere.
    let reasons = report.skip_reasons().expect("diagnostics were requested");
    assert_eq!(reasons.null_range, 1);
}

#[test]
fn flatten_produces_sorted_offset_triples_per_file() {
    let output = counter_sol_output();
    let report = CoverageReport::from_compiler_output(&output).unwrap();
    let flat = report.flatten();
    let triples = &flat["Counter.sol"];
    assert!(!triples.is_empty());
    let offsets: Vec<u32> = triples.iter().map(|(offset, _, _)| *offset).collect();
    let mut sorted = offsets.clone();
    sorted.sort();
    assert_eq!(offsets, sorted);
}

#[test]
fn reprocessing_the_same_trace_is_commutative_with_a_shuffled_duplicate() {
    let output = counter_sol_output();
    let index = ContractIndex::build(&output).unwrap();

    let mut report_a = CoverageReport::from_compiler_output(&output).unwrap();
    let trace_a: Trace =
        serde_json::from_str(r#"{ "code": "0x6001600250", "ops": [{ "pc": 0 }, { "pc": 0 }, { "pc": 2 }] }"#)
            .unwrap();
    report_a.record_trace(&index, &trace_a, CoverageOptions::default()).unwrap();

    let mut report_b = CoverageReport::from_compiler_output(&output).unwrap();
    let trace_b: Trace =
        serde_json::from_str(r#"{ "code": "0x6001600250", "ops": [{ "pc": 2 }, { "pc": 0 }, { "pc": 0 }] }"#)
            .unwrap();
    report_b.record_trace(&index, &trace_b, CoverageOptions::default()).unwrap();

    assert_eq!(report_a.flatten(), report_b.flatten());
}
