use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TEXT_INVOICE: &str = "电子发票（普通发票）\n\
    发票号码:25447000001684857775\n\
    开票日期:2025年08月06日\n\
    购买方信息  91410104MAD3TRFC98名称:郑州琳之星通讯有限公司统一社会信用代码/纳税人识别号:\n\
    销售方信息  914419000585344943名称:华为终端有限公司统一社会信用代码/纳税人识别号:\n\
    项目名称 规格型号 单位 数量 单价 金额 税率/征收率 税额\n\
    合        计¥167.26¥21.74\n\
    价税合计（大写）壹佰捌拾玖圆整（小写）¥189.00\n";

const STRUCTURED_INVOICE: &str = r#"{
    "log_id": 7,
    "words_result": {
        "InvoiceNum": "123456",
        "InvoiceCode": "",
        "InvoiceDate": "2025年11月14日",
        "SellerName": "另一公司",
        "AmountInFiguers": "¥113.00",
        "CommodityName": [{"row": "1", "word": "*服务*咨询费"}],
        "CommodityAmount": [{"row": "1", "word": "100.00"}]
    }
}"#;

fn fapiao() -> Command {
    Command::cargo_bin("fapiao").unwrap()
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn test_process_text_file() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "invoice.txt", TEXT_INVOICE);

    let output = fapiao().args(["process", &input]).output().unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["invoiceNumber"], "84857775");
    assert_eq!(record["invoiceCode"], "254470000016");
    assert_eq!(record["invoiceDate"], "2025-08-06");
    assert_eq!(record["purchaserName"], "郑州琳之星通讯有限公司");
    assert_eq!(record["sellerTaxId"], "914419000585344943");
    assert_eq!(record["totalAmountInclTax"], "189.00");
    assert_eq!(record["invoiceType"], "增值税普通发票");
}

#[test]
fn test_process_structured_file() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "response.json", STRUCTURED_INVOICE);

    let output = fapiao().args(["process", &input]).output().unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["invoiceCode"], "123456");
    assert_eq!(record["invoiceDate"], "2025-11-14");
    assert_eq!(record["totalAmountInclTax"], "113.00");
    assert_eq!(record["lineItems"][0]["amount"], "100.00");
}

#[test]
fn test_process_source_override() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "response.dat", STRUCTURED_INVOICE);

    fapiao()
        .args(["process", &input, "--source", "structured", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("invoice_number,invoice_code"))
        .stdout(predicate::str::contains("123456,123456,2025-11-14"));
}

#[test]
fn test_process_text_format_and_output_file() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "invoice.txt", TEXT_INVOICE);
    let output = dir.path().join("out.txt");

    fapiao()
        .args(["process", &input, "--format", "text", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("Invoice: 84857775"));
    assert!(content.contains("华为终端有限公司"));
}

#[test]
fn test_process_validate_reports_missing_fields() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "partial.txt", "发票号码：12345678");

    fapiao()
        .args(["process", &input, "--validate"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Missing seller name"));
}

#[test]
fn test_process_empty_input_fails() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "empty.txt", "  \n ");

    fapiao()
        .args(["process", &input])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input text is empty"));
}

#[test]
fn test_process_upstream_error_fails() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "error.json", r#"{"error_code": 17, "error_msg": "Open api daily request limit reached"}"#);

    fapiao()
        .args(["process", &input])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OCR service error 17"));
}

#[test]
fn test_process_missing_file() {
    fapiao()
        .args(["process", "/nonexistent/invoice.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_batch_continues_after_failures() {
    let input_dir = TempDir::new().unwrap();
    write(&input_dir, "good.txt", TEXT_INVOICE);
    write(&input_dir, "response.json", STRUCTURED_INVOICE);
    write(&input_dir, "empty.txt", "");
    write(&input_dir, "notes.md", "ignored");

    let output_dir = TempDir::new().unwrap();
    let pattern = format!("{}/*", input_dir.path().display());

    fapiao()
        .args(["batch", &pattern, "--summary", "-j", "2", "--output-dir"])
        .arg(output_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 files"))
        .stdout(predicate::str::contains("empty.txt"));

    let good = fs::read_to_string(output_dir.path().join("good.json")).unwrap();
    let good: serde_json::Value = serde_json::from_str(&good).unwrap();
    assert_eq!(good["invoiceNumber"], "84857775");
    assert!(output_dir.path().join("response.json").exists());
    assert!(!output_dir.path().join("empty.json").exists());

    let summary = fs::read_to_string(output_dir.path().join("summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().any(|l| l.starts_with("empty.txt,error,")));
    assert!(lines.iter().any(|l| l.starts_with("good.txt,success,84857775,254470000016")));
}

#[test]
fn test_batch_no_matches() {
    let dir = TempDir::new().unwrap();
    let pattern = format!("{}/*.txt", dir.path().display());

    fapiao()
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn test_config_init_show_get() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("fapiao").join("config.json");
    let config_arg = config_path.display().to_string();

    fapiao()
        .args(["--config", &config_arg, "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(config_path.exists());

    fapiao()
        .args(["--config", &config_arg, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    fapiao()
        .args(["--config", &config_arg, "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"keyword_max_chars\": 100"));

    fapiao()
        .args(["--config", &config_arg, "config", "get", "extraction.split.short_length"])
        .assert()
        .success()
        .stdout(predicate::str::diff("18\n"));

    fapiao()
        .args(["--config", &config_arg, "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exists"));
}

#[test]
fn test_config_controls_extraction() {
    let dir = TempDir::new().unwrap();
    let config = write(
        &dir,
        "config.json",
        r#"{"extraction": {"split": {"paired_lengths": [], "short_length": 19}}, "output": {"format": "csv"}}"#,
    );
    let input = write(&dir, "invoice.txt", "发票号码:25447000001684857775");

    fapiao()
        .args(["--config", &config, "process", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("25447000001684857775,25447000001684857775"));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "config.json", r#"{"output": {"jobs": 0}}"#);
    let input = write(&dir, "invoice.txt", TEXT_INVOICE);

    fapiao()
        .args(["--config", &config, "process", &input])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}
