//! Description rewriter tests over real resource documentation.

use cfn_modgen::{rewrite, split_sentences, DescriptionRewriter};

#[test]
fn short_inputs() {
    assert_eq!(rewrite("a"), vec!["a."]);
    assert!(rewrite("").is_empty());
    assert_eq!(rewrite("CloudWatch"), vec!["CloudWatch."]);
}

#[test]
fn acronyms_are_left_alone() {
    let text =
        "The Amazon Resource Name (ARN) of the Amazon SQS queue to which Amazon S3 publishes a message.";
    assert_eq!(rewrite(text), vec![text]);
}

#[test]
fn upper_case_true_becomes_literal() {
    let expected = vec![
        "Setting this element to C(True) causes Amazon S3 to reject calls to PUT Bucket policy.",
    ];
    assert_eq!(
        rewrite("Setting this element to TRUE causes Amazon S3 to reject calls to PUT Bucket policy."),
        expected
    );
    // Terminal period is added when missing
    assert_eq!(
        rewrite("Setting this element to TRUE causes Amazon S3 to reject calls to PUT Bucket policy"),
        expected
    );
}

#[test]
fn numbers_after_values_are() {
    assert_eq!(
        rewrite("Possible values are: 1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1827, and 3653."),
        vec!["Possible values are: C(1), C(3), C(5), C(7), C(14), C(30), C(60), C(90), C(120), C(150), C(180), C(365), C(400), C(545), C(731), C(1827), and C(3653)."]
    );
}

#[test]
fn storage_classes_are_wrapped_once() {
    assert_eq!(
        rewrite("Container for the transition rule that describes when noncurrent objects transition to the STANDARD_IA, ONEZONE_IA, INTELLIGENT_TIERING, GLACIER_IR, C(GLACIER), or DEEP_ARCHIVE storage class."),
        vec!["Container for the transition rule that describes when noncurrent objects transition to the C(STANDARD_IA), C(ONEZONE_IA), C(INTELLIGENT_TIERING), C(GLACIER_IR), C(GLACIER), or C(DEEP_ARCHIVE) storage class."]
    );
}

#[test]
fn declared_values_are_wrapped() {
    let rewriter = DescriptionRewriter::new().with_vocabulary(["GLACIER", "STANDARD"]);
    assert_eq!(
        rewriter.rewrite("Objects move to GLACIER after 30 days, or stay in STANDARD."),
        vec!["Objects move to C(GLACIER) after 30 days, or stay in C(STANDARD)."]
    );
    // Incidental acronyms outside the vocabulary stay bare
    assert_eq!(
        rewriter.rewrite("Uses an AWS KMS key."),
        vec!["Uses an AWS KMS key."]
    );
}

#[test]
fn parameter_references() {
    assert_eq!(
        rewrite("If you specify LogGroupName, you must also specify RetentionInDays."),
        vec!["If you specify I(log_group_name), you must also specify I(retention_in_days)."]
    );
    assert_eq!(
        rewrite("Required when LoggingConfig.DestinationBucketName is set."),
        vec!["Required when I(logging_config.destination_bucket_name) is set."]
    );
}

#[test]
fn longer_references_substitute_first() {
    assert_eq!(
        rewrite("Set BucketName or ReplicationConfiguration.Rules.DestinationBucketName and BucketName."),
        vec!["Set I(bucket_name) or I(replication_configuration.rules.destination_bucket_name) and I(bucket_name)."]
    );
}

#[test]
fn links_and_brackets() {
    assert_eq!(
        rewrite("For more information, see [Tagging] https://docs.aws.amazon.com/tagging.html."),
        vec!["For more information, see U(https://docs.aws.amazon.com/tagging.html)."]
    );
}

#[test]
fn quotes_are_dropped() {
    assert_eq!(
        rewrite("The value can't be \"empty\" or `null`."),
        vec!["The value cant be empty or null."]
    );
}

#[test]
fn sentence_boundaries() {
    assert_eq!(
        split_sentences("The log group name. Must be unique.\nSee the guide."),
        vec!["The log group name.", "Must be unique.", "See the guide."]
    );
    // Abbreviation periods followed by lower case do not split
    assert_eq!(
        split_sentences("Use a prefix, e.g. the stack name."),
        vec!["Use a prefix, e.g. the stack name."]
    );
    assert_eq!(
        split_sentences("The resource ARN (for example, arn:aws:logs). The name."),
        vec!["The resource ARN (for example, arn:aws:logs).", "The name."]
    );
    assert_eq!(
        split_sentences("Supported in U.S. Regions only."),
        vec!["Supported in U.S. Regions only."]
    );
}

#[test]
fn question_sentences() {
    assert_eq!(
        rewrite("Should the group be encrypted? Set KmsKeyId to enable it."),
        vec!["Should the group be encrypted?", "Set I(kms_key_id) to enable it."]
    );
}

#[test]
fn rewriting_markup_is_stable() {
    let texts = [
        "Possible values are: 1, 3, 5.",
        "If you specify LogGroupName, set the class to STANDARD_IA for now. See https://example.com/docs.",
        "Setting this element to TRUE causes Amazon S3 to reject calls.",
        "Done? Yes.",
    ];
    for text in texts {
        let once = rewrite(text);
        let twice: Vec<String> = once.iter().flat_map(|s| rewrite(s)).collect();
        assert_eq!(twice, once, "{}", text);
    }
}
