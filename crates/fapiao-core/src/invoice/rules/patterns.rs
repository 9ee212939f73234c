//! Common regex patterns for Chinese VAT invoice extraction.
//!
//! Digit classes are written as `[0-9]` rather than `\d`, which would also
//! accept full-width and other Unicode digits.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice number (发票号码), possibly with the code glued in front
    pub static ref INVOICE_NUMBER_STRICT: Regex = Regex::new(
        r"发票号码[：:]\s*([0-9]{8,})"
    ).unwrap();

    pub static ref INVOICE_NUMBER_RELAXED: Regex = Regex::new(
        r"发票号码[：:]\s*([0-9]+)"
    ).unwrap();

    // Invoice code (发票代码)
    pub static ref INVOICE_CODE_STRICT: Regex = Regex::new(
        r"发票代码[：:]\s*([0-9]{10,})"
    ).unwrap();

    pub static ref INVOICE_CODE_RELAXED: Regex = Regex::new(
        r"发票代码[：:]\s*([0-9]+)"
    ).unwrap();

    // Bare code printed on the line below "发票号码 ... 开票日期"
    pub static ref INVOICE_CODE_NEXT_LINE: Regex = Regex::new(
        r"(?m)发票号码[：:]\s*[0-9]{10,}[^\n]*?开票日期[^\n]*\n[ \t]*([0-9]{10,12})[ \t]*\r?$"
    ).unwrap();

    // Issue date (开票日期)
    pub static ref ISSUE_DATE_LABELED: Regex = Regex::new(
        r"开票日期[：:\s]+([0-9]{4}[-年/][0-9]{1,2}[-月/][0-9]{1,2}日?)"
    ).unwrap();

    pub static ref DATE_LABELED: Regex = Regex::new(
        r"日期[：:\s]+([0-9]{4}[-年/][0-9]{1,2}[-月/][0-9]{1,2}日?)"
    ).unwrap();

    pub static ref DATE_CHINESE: Regex = Regex::new(
        r"([0-9]{4}年[0-9]{1,2}月[0-9]{1,2}日)"
    ).unwrap();

    pub static ref DATE_DASHED: Regex = Regex::new(
        r"([0-9]{4}-[0-9]{1,2}-[0-9]{1,2})"
    ).unwrap();

    pub static ref DATE_SLASHED: Regex = Regex::new(
        r"([0-9]{4}/[0-9]{1,2}/[0-9]{1,2})"
    ).unwrap();

    pub static ref DATE_PARTS: Regex = Regex::new(
        r"([0-9]{4})[-年/]([0-9]{1,2})[-月/]([0-9]{1,2})日?"
    ).unwrap();

    // Party names outside an anchored section
    pub static ref PURCHASER_NAME_SECTION: Regex = Regex::new(
        r"购买方信息[\s\S]*?名称[：:]\s*([^\n统一社会信用代码纳税人识别号/]{2,50})"
    ).unwrap();

    pub static ref PURCHASER_NAME_LOOSE: Regex = Regex::new(
        r"购买方[\s\S]*?名称[：:]\s*([^\n统一社会信用代码纳税人识别号/：:]{2,50})"
    ).unwrap();

    pub static ref SELLER_NAME_SECTION: Regex = Regex::new(
        r"销售[\s\S]*?方信息[\s\S]*?名称[：:]\s*([^\n统一社会信用代码纳税人识别号/：:]{2,50})"
    ).unwrap();

    pub static ref SELLER_NAME_LOOSE: Regex = Regex::new(
        r"销售[\s\S]*?名称[：:]\s*([^\n统一社会信用代码纳税人识别号/：:]{2,50})"
    ).unwrap();

    // Taxpayer identification numbers (纳税人识别号 / 统一社会信用代码)
    pub static ref PURCHASER_TAX_ID: Regex = Regex::new(
        r"(?i)购买方[：:]\s*纳税人识别号[：:]\s*([A-Z0-9]{15,20})"
    ).unwrap();

    pub static ref PURCHASER_TAX_ID_SHORT: Regex = Regex::new(
        r"(?i)购买方[：:]\s*识别号[：:]\s*([A-Z0-9]{15,20})"
    ).unwrap();

    pub static ref TAX_ID_LABELED: Regex = Regex::new(
        r"(?i)纳税人识别号[：:]\s*([A-Z0-9]{15,20})"
    ).unwrap();

    pub static ref SELLER_TAX_ID: Regex = Regex::new(
        r"(?i)销售方[：:]\s*纳税人识别号[：:]\s*([A-Z0-9]{15,20})"
    ).unwrap();

    pub static ref SELLER_TAX_ID_SHORT: Regex = Regex::new(
        r"(?i)销售方[：:]\s*识别号[：:]\s*([A-Z0-9]{15,20})"
    ).unwrap();

    pub static ref TAX_ID_TOKEN: Regex = Regex::new(
        r"(?:^|[^0-9A-Za-z])([0-9A-Z]{15,20})(?:[^0-9A-Za-z]|$)"
    ).unwrap();

    // Total amount excluding tax. "价税合计" must not match, hence the 税 guard.
    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        r"(?:^|[^税])合\s*计[：:]?\s*[¥￥]?\s*([0-9][0-9,]*(?:\.[0-9]+)?)"
    ).unwrap();

    pub static ref TOTAL_AMOUNT_LABELED: Regex = Regex::new(
        r"(?:金额合计|不含税金额)[：:\s]*[¥￥]?\s*([0-9][0-9,]*(?:\.[0-9]+)?)"
    ).unwrap();

    pub static ref AMOUNT_COLUMN: Regex = Regex::new(
        r"金额\s+[¥￥]?\s*([0-9][0-9,]*(?:\.[0-9]+)?)"
    ).unwrap();

    // Total tax: the second amount on the 合计 line, e.g. "合计¥167.26¥21.74"
    pub static ref TOTAL_TAX: Regex = Regex::new(
        r"(?:^|[^税])合\s*计[：:]?\s*[¥￥]?\s*[0-9][0-9,]*(?:\.[0-9]+)?(?:\s*[¥￥]\s*|\s+)([0-9][0-9,]*(?:\.[0-9]+)?)"
    ).unwrap();

    pub static ref TAX_AMOUNT_LABELED: Regex = Regex::new(
        r"税额[：:\s]*[¥￥]?\s*([0-9][0-9,]*(?:\.[0-9]+)?)"
    ).unwrap();

    pub static ref VAT_LABELED: Regex = Regex::new(
        r"增值税[：:\s]*[¥￥]?\s*([0-9][0-9,]*(?:\.[0-9]+)?)"
    ).unwrap();

    // Total including tax (价税合计), written out in words and in figures
    pub static ref AMOUNT_IN_FIGURES_FULL: Regex = Regex::new(
        r"价税合计\s*[（(]大写[）)][^¥￥0-9]*[（(]小写[）)]\s*[¥￥]?\s*([0-9][0-9,]*(?:\.[0-9]+)?)"
    ).unwrap();

    pub static ref AMOUNT_IN_FIGURES: Regex = Regex::new(
        r"价税合计[^¥￥0-9]*[¥￥]?\s*([0-9][0-9,]*(?:\.[0-9]+)?)"
    ).unwrap();

    pub static ref AMOUNT_IN_FIGURES_SMALL: Regex = Regex::new(
        r"小写[）)]?\s*[¥￥]?\s*([0-9][0-9,]*(?:\.[0-9]+)?)"
    ).unwrap();

    pub static ref GRAND_TOTAL: Regex = Regex::new(
        r"总计[：:\s]*[¥￥]?\s*([0-9][0-9,]*(?:\.[0-9]+)?)"
    ).unwrap();
}
