use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use docx_template_rust::docx::DocxPackage;
use docx_template_rust::template::tables;
use docx_template_rust::{generate_document, Conf, VariableMapping};

/// 用 JSON 变量填充 DOCX 模板，并按变量展开带标题的表格
#[derive(Debug, Parser)]
#[clap(name = "docx-template", version)]
struct Args {
    /// 模板路径
    #[clap(long, short = 't', value_name = "TEMPLATE")]
    template: Option<PathBuf>,

    /// 输出路径
    #[clap(long, short = 'o', value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// 变量文件（JSON）
    #[clap(long, short = 'v', value_name = "VARIABLES")]
    variables: Option<PathBuf>,

    /// 配置文件（JSON），命令行参数优先
    #[clap(long, short = 'c', value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// 生成后删除的表格标题，可重复；追加到配置文件中的列表之后
    #[clap(long = "remove-table", value_name = "TABLE_ID")]
    remove_tables: Vec<String>,

    /// 文档标题
    #[clap(long)]
    title: Option<String>,

    /// 表格变量前缀
    #[clap(long, value_name = "PREFIX")]
    table_prefix: Option<String>,

    /// 单个表格最多生成的行数
    #[clap(long, value_name = "ROWS")]
    max_rows: Option<usize>,

    /// 不合并格式相同的文本运行
    #[clap(long)]
    no_merge_runs: bool,

    /// 只列出模板中的表格标题
    #[clap(long)]
    list_tables: bool,

    /// 以 JSON 输出生成报告
    #[clap(long)]
    json: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(message) = run(args) {
        eprintln!("{}", message);
        exit(1);
    }
}

/// 用命令行参数覆盖配置文件中的值
///
/// 单值参数直接覆盖；`--remove-table` 追加到已有列表，重复的标题只保留一次。
fn apply_args(conf: &mut Conf, args: &Args) {
    if args.template.is_some() {
        conf.template_path = args.template.clone();
    }
    if args.output.is_some() {
        conf.output_path = args.output.clone();
    }
    if args.variables.is_some() {
        conf.variables_path = args.variables.clone();
    }
    for table_id in &args.remove_tables {
        if !conf.remove_tables.contains(table_id) {
            conf.remove_tables.push(table_id.clone());
        }
    }
    if args.title.is_some() {
        conf.title = args.title.clone();
    }
    if let Some(prefix) = &args.table_prefix {
        conf.table_prefix = prefix.clone();
    }
    if let Some(max_rows) = args.max_rows {
        conf.max_rows = max_rows;
    }
    if args.no_merge_runs {
        conf.merge_runs = false;
    }
}

fn run(args: Args) -> Result<(), String> {
    let mut conf = match &args.config {
        Some(path) => Conf::from_json_file(path).map_err(|e| format!("读取配置失败: {}", e))?,
        None => Conf::default(),
    };
    apply_args(&mut conf, &args);
    conf.validate().map_err(|e| format!("配置无效: {}", e))?;

    if args.list_tables {
        let template = conf.template_path.as_ref().ok_or("缺少模板路径 (--template)")?;
        let package = DocxPackage::load(template).map_err(|e| format!("读取模板失败: {}", e))?;
        for (_, caption) in tables(package.document()) {
            println!("{}", caption.as_deref().unwrap_or("<无标题>"));
        }
        return Ok(());
    }

    let variables = match &conf.variables_path {
        Some(path) => {
            VariableMapping::from_json_file(path).map_err(|e| format!("读取变量失败: {}", e))?
        }
        None => VariableMapping::new(),
    };

    let report = generate_document(&conf, &variables).map_err(|e| e.to_string())?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{}", json);
    } else {
        println!("生成完成！");
        for table in &report.tables {
            println!("表格 {}: {:?}", table.table_id, table.outcome);
        }
        println!("删除的表格: {:?}", report.removed_tables);
        println!("替换的占位符数量: {}", report.replacements);
        if let Some(path) = &report.output_path {
            println!("输出已保存到: {}", path.display());
        }
    }

    Ok(())
}
