// tests/roundtrip_tests.rs

use cfn_script::decompiler::MAX_DEPTH;
use cfn_script::{compile, decompile, pretty_print};
use serde_json::{json, Value};

/// Decompile `tree`, compile the text back and compare.
fn assert_tree_roundtrip(tree: Value) {
    let source = decompile(&tree).unwrap_or_else(|e| panic!("decompile failed: {}", e));
    let back = compile(&source).unwrap_or_else(|e| panic!("{}\n{}", source, e));
    assert_eq!(back, tree, "source was:\n{}", source);
    assert_eq!(pretty_print(&source), source);
}

/// Compile `source`, decompile it and compile again; both trees must match.
fn assert_source_roundtrip(source: &str) -> String {
    let tree = compile(source).unwrap_or_else(|e| panic!("{}\n{}", source, e));
    let text = decompile(&tree).unwrap_or_else(|e| panic!("decompile failed: {}", e));
    let again = compile(&text).unwrap_or_else(|e| panic!("{}\n{}", text, e));
    assert_eq!(again, tree, "source was:\n{}", text);
    text
}

// ============================================================================
// Tree first
// ============================================================================

#[test]
fn test_full_template() {
    assert_tree_roundtrip(json!({
        "AWSTemplateFormatVersion": "2010-09-09",
        "Description": "Queue with an optional alarm",
        "Transform": ["AWS::Serverless-2016-10-31", "AWS::LanguageExtensions"],
        "Metadata": { "Owner": "ops", "Script": "line1\nline2" },
        "Globals": { "Function": { "Timeout": 30 } },
        "Parameters": {
            "Env": { "Type": "String", "AllowedValues": ["dev", "prod"], "Default": "dev" }
        },
        "Mappings": {
            "Regions": { "us-east-1": { "Ami": "ami-1" }, "eu-west-1": { "Ami": "ami-2" } }
        },
        "Conditions": {
            "IsProd": { "Fn::Equals": [{ "Ref": "Env" }, "prod"] },
            "IsDev": { "Fn::Not": [{ "Condition": "IsProd" }] }
        },
        "Resources": {
            "Queue": {
                "Type": "AWS::SQS::Queue",
                "Properties": {
                    "QueueName": { "Fn::Sub": "${AWS::StackName}-${Env}" },
                    "VisibilityTimeout": 60,
                    "Tags": [{ "Key": "ami", "Value": {
                        "Fn::FindInMap": ["Regions", { "Ref": "AWS::Region" }, "Ami"]
                    } }]
                },
                "DeletionPolicy": "Retain"
            },
            "Alarm": {
                "Type": "AWS::CloudWatch::Alarm",
                "Properties": {
                    "Dimensions": [{ "Name": "QueueName", "Value": { "Fn::GetAtt": ["Queue", "QueueName"] } }],
                    "Threshold": { "Fn::If": ["IsProd", 10, { "Ref": "AWS::NoValue" }] }
                },
                "DependsOn": "Queue",
                "Condition": "IsProd"
            }
        },
        "Outputs": {
            "QueueUrl": { "Value": { "Ref": "Queue" }, "Condition": "IsProd" },
            "QueueArn": {
                "Value": { "Fn::GetAtt": ["Queue", "Arn"] },
                "Export": { "Name": { "Fn::Join": ["-", [{ "Ref": "AWS::StackName" }, "arn"]] } }
            }
        },
        "Rules": { "Check": { "Assertions": [] } }
    }));
}

#[test]
fn test_attribute_paths() {
    assert_tree_roundtrip(json!({
        "Resources": { "Widget": { "Type": "Custom::Widget" } },
        "Outputs": {
            "Single": { "Value": { "Fn::GetAtt": ["Widget", "Arn"] } },
            "Dotted": { "Value": { "Fn::GetAtt": ["Widget", "Endpoint.Address"] } },
            "Nested": { "Value": { "Fn::GetAtt": ["Widget", "Compliance", "Type"] } },
            "Undeclared": { "Value": { "Fn::GetAtt": ["Elsewhere", "Arn"] } }
        }
    }));
}

#[test]
fn test_empty_and_absent_properties() {
    assert_tree_roundtrip(json!({
        "Resources": {
            "Empty": { "Type": "AWS::SNS::Topic", "Properties": {} },
            "Absent": { "Type": "AWS::SNS::Topic" }
        }
    }));
}

#[test]
fn test_reference_fallbacks() {
    assert_tree_roundtrip(json!({
        "Conditions": { "IsProd": true },
        "Outputs": {
            "A": { "Value": { "Ref": "Undeclared" } },
            "B": { "Value": { "Ref": "IsProd" } },
            "C": { "Value": { "Ref": "AWS::Odd-Name" } },
            "D": { "Value": { "Ref": 1 } },
            "E": { "Value": { "Condition": "Undeclared" } },
            "F": { "Value": { "Ref": "Resource" } }
        }
    }));
}

#[test]
fn test_function_fallbacks() {
    assert_tree_roundtrip(json!({
        "Outputs": {
            "A": { "Value": { "Fn::Odd-Name": 1 } },
            "B": { "Value": { "Fn::Join": "-" } },
            "C": { "Value": { "Fn::Not": true } },
            "D": { "Value": { "Fn::Ref": "x" } },
            "E": { "Value": { "Fn::If": [{ "Ref": "AWS::Region" }, 1, 2] } },
            "F": { "Value": { "Fn::Resource": [] } }
        }
    }));
}

#[test]
fn test_function_shapes() {
    assert_tree_roundtrip(json!({
        "Conditions": { "IsProd": true },
        "Outputs": {
            "Base64": { "Value": { "Fn::Base64": "hi" } },
            "Wrapped": { "Value": { "Fn::Base64": ["hi"] } },
            "Single": { "Value": { "Fn::Not": [{ "Condition": "IsProd" }] } },
            "Unary": { "Value": { "Fn::And": [true] } },
            "Empty": { "Value": { "Fn::GetAZs": [] } },
            "Listed": { "Value": { "Fn::Select": [0, { "Fn::GetAZs": "" }] } },
            "Quoted": { "Value": { "Fn::If": ["Other", 1, 2] } }
        }
    }));
}

#[test]
fn test_operator_precedence() {
    let is_prod = json!({ "Condition": "IsProd" });
    let or = json!({ "Fn::Or": [is_prod, is_prod] });
    let and = json!({ "Fn::And": [is_prod, is_prod] });
    let equals = json!({ "Fn::Equals": [1, 2] });

    assert_tree_roundtrip(json!({
        "Conditions": {
            "IsProd": true,
            "A": { "Fn::And": [or, is_prod] },
            "B": { "Fn::And": [and, is_prod] },
            "C": { "Fn::Or": [and, or] },
            "D": { "Fn::Not": [or] },
            "E": { "Fn::Not": [{ "Fn::Not": [equals] }] },
            "F": { "Fn::Equals": [equals, true] },
            "G": { "Fn::Equals": [{ "Fn::Not": [is_prod] }, false] },
            "H": { "Fn::Or": [is_prod, is_prod, { "Fn::Not": [equals] }] }
        }
    }));
}

#[test]
fn test_parameter_and_condition_share_a_name() {
    assert_tree_roundtrip(json!({
        "Parameters": { "Stage": { "Type": "String" } },
        "Conditions": { "Stage": { "Fn::Equals": [{ "Ref": "Stage" }, "prod"] } },
        "Outputs": {
            "ByRef": { "Value": { "Ref": "Stage" } },
            "Cond": { "Value": { "Fn::If": ["Stage", 1, 2] } },
            "Gated": { "Value": 1, "Condition": "Stage" }
        }
    }));
}

#[test]
fn test_names_and_types_that_need_quotes() {
    assert_tree_roundtrip(json!({
        "Resources": {
            "1Widget": { "Type": "Custom::odd-name" },
            "Plain": { "Type": "Standalone", "DependsOn": ["1Widget", "Elsewhere"] }
        },
        "Outputs": {
            "Key-With-Dashes": { "Value": { "Ref": "1Widget" } }
        }
    }));
}

#[test]
fn test_scalars() {
    assert_tree_roundtrip(json!({
        "Metadata": {
            "Numbers": [0, -7, 42, 2.0, -0.5, 18446744073709551615u64],
            "Flags": [true, false, null],
            "Text": "quote \" backslash \\ tab \t 'single'",
            "": "empty key"
        }
    }));
}

/// Round trip on a thread with the default 2 MiB stack.
fn assert_tree_roundtrip_on_small_stack(tree: Value) {
    std::thread::Builder::new()
        .stack_size(2 << 20)
        .spawn(move || assert_tree_roundtrip(tree))
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn test_deepest_values_reparse() {
    let mut value = json!("leaf");
    for level in 0..MAX_DEPTH - 1 {
        value = if level % 2 == 0 {
            json!([value])
        } else {
            json!({ "Inner": value })
        };
    }
    assert_tree_roundtrip_on_small_stack(json!({ "Metadata": { "Deep": value } }));
}

#[test]
fn test_deepest_conditions_reparse() {
    let is_prod = json!({ "Condition": "IsProd" });
    let mut condition = is_prod.clone();
    for _ in 0..MAX_DEPTH / 2 - 1 {
        condition = json!({ "Fn::Not": [{ "Fn::Or": [condition, is_prod.clone()] }] });
    }
    assert_tree_roundtrip_on_small_stack(json!({
        "Conditions": { "IsProd": true, "Deep": condition }
    }));
}

// ============================================================================
// Source first
// ============================================================================

#[test]
fn test_source_roundtrip() {
    let source = "AWSTemplateFormatVersion \"2010-09-09\"\n\
                  Env = Parameter { Type: \"String\" }\n\
                  IsProd = Condition Env == \"prod\" && !(AWS.Region != \"us-east-1\")\n\
                  Bucket = Resource AWS::S3::Bucket {\n\
                  \x20 BucketName: Sub(\"${AWS::StackName}-logs\")\n\
                  } Condition(IsProd) DeletionPolicy(\"Retain\")\n\
                  Name = Output { Value: Bucket.Arn, Condition: IsProd }";
    assert_source_roundtrip(source);
}

#[test]
fn test_source_roundtrip_is_stable() {
    let source = "Topic = Resource AWS::SNS::Topic\n\
                  Queue = Resource AWS::SQS::Queue { Name: \"q\" } DependsOn([Topic])\n\
                  Arn = Output { Value: Queue[\"Compliance\", \"Type\"] }";
    let first = assert_source_roundtrip(source);
    let second = assert_source_roundtrip(&first);
    assert_eq!(first, second);
}

#[test]
fn test_comments_do_not_survive() {
    let text = assert_source_roundtrip("# stack\nTopic = Resource AWS::SNS::Topic // inline\n");
    assert_eq!(text, "Topic = Resource AWS::SNS::Topic\n");
}

#[test]
fn test_single_quotes_normalize() {
    let text = assert_source_roundtrip("Description 'it\\'s fine'");
    assert_eq!(text, "Description \"it's fine\"\n");
}
