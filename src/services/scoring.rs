// src/services/scoring.rs
//
// Motor de pesos das comissões. Tudo aqui é puro: nada é gravado, o peso de
// uma tarefa é recalculado a cada leitura a partir do tipo e dos dados
// associados.

use rust_decimal::{prelude::ToPrimitive, Decimal};

use crate::models::commission::{CustomServiceItem, PredefinedService, ServiceType};

/// Separador entre as seções da descrição estruturada.
pub const SECTION_SEPARATOR: &str = "\n\n";
/// Rótulo da lista de equipamentos de um orçamento.
pub const BUDGET_PREFIX: &str = "Equipamentos Orçados: ";
/// Rótulo da lista de itens de uma venda (só exibição).
pub const SALE_PREFIX: &str = "Itens Vendidos: ";
pub const NOTES_PREFIX: &str = "Notas: ";

/// Cada fatia (ou fração) de R$ 500 vendida vale 1 ponto.
pub const SALE_WEIGHT_STEP: i64 = 500;

const HIGH_VALUE_WEIGHT: i64 = 2;
const REGULAR_EQUIPMENT_WEIGHT: i64 = 1;

/// Equipamentos que valem peso dobrado num orçamento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighValueEquipment {
    ImpressoraG,
    PcGamer,
    Notebook,
    Servidor,
    AllInOne,
    Nobreak,
}

impl HighValueEquipment {
    pub const ALL: [HighValueEquipment; 6] = [
        HighValueEquipment::ImpressoraG,
        HighValueEquipment::PcGamer,
        HighValueEquipment::Notebook,
        HighValueEquipment::Servidor,
        HighValueEquipment::AllInOne,
        HighValueEquipment::Nobreak,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HighValueEquipment::ImpressoraG => "Impressora G",
            HighValueEquipment::PcGamer => "PC Gamer",
            HighValueEquipment::Notebook => "Notebook",
            HighValueEquipment::Servidor => "Servidor",
            HighValueEquipment::AllInOne => "All in one",
            HighValueEquipment::Nobreak => "Nobreak",
        }
    }

    /// Comparação exata: maiúsculas e acentos contam.
    pub fn from_label(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|equipment| equipment.label() == name)
    }
}

/// O que o motor precisa enxergar de uma tarefa de comissão.
pub trait WeightedTask {
    fn service_type(&self) -> &ServiceType;
    fn description(&self) -> Option<&str>;
    fn commission_value(&self) -> Option<Decimal>;
    fn predefined_services(&self) -> &[PredefinedService];
    fn custom_services(&self) -> &[CustomServiceItem];
}

/// Peso total de uma tarefa (sempre >= 0).
pub fn total_weight<T: WeightedTask + ?Sized>(task: &T) -> i64 {
    match task.service_type() {
        ServiceType::Servico => service_weight(task.predefined_services(), task.custom_services()),
        ServiceType::Orcamento => budget_weight(task.description()),
        ServiceType::Venda => sale_weight(task.commission_value()),
        ServiceType::Unrecognized(_) => 0,
    }
}

/// Pontuação de dificuldade: soma dos pesos das tarefas informadas.
pub fn difficulty_score<'a, T, I>(tasks: I) -> i64
where
    T: WeightedTask + 'a,
    I: IntoIterator<Item = &'a T>,
{
    tasks.into_iter().map(|task| total_weight(task)).sum()
}

pub fn service_weight(predefined: &[PredefinedService], custom: &[CustomServiceItem]) -> i64 {
    let predefined_weight: i64 = predefined.iter().map(|s| i64::from(s.weight)).sum();
    let custom_weight: i64 = custom.iter().map(|s| i64::from(s.weight)).sum();
    predefined_weight + custom_weight
}

pub fn equipment_weight(name: &str) -> i64 {
    match HighValueEquipment::from_label(name) {
        Some(_) => HIGH_VALUE_WEIGHT,
        None => REGULAR_EQUIPMENT_WEIGHT,
    }
}

pub fn budget_weight(description: Option<&str>) -> i64 {
    match description {
        None | Some("") => 0,
        Some(description) => budget_equipment(description)
            .iter()
            .map(|name| equipment_weight(name))
            .sum(),
    }
}

/// Lista de equipamentos gravada na primeira seção da descrição de um orçamento.
///
/// Sem o rótulo esperado a seção inteira é tratada como lista; o resultado
/// fica errado mas nunca falha.
pub fn budget_equipment(description: &str) -> Vec<String> {
    split_list(&first_section_body(description, BUDGET_PREFIX))
}

/// ⌈valor / 500⌉ em aritmética decimal exata.
pub fn sale_weight(commission_value: Option<Decimal>) -> i64 {
    match commission_value {
        Some(value) if value > Decimal::ZERO => (value / Decimal::from(SALE_WEIGHT_STEP))
            .ceil()
            .to_i64()
            .unwrap_or(i64::MAX),
        _ => 0,
    }
}

// --- Descrição estruturada (orçamento / venda) ---

/// "Equipamentos Orçados: a, b\n\nNotas: ..."
pub fn budget_description(equipment: &[String], notes: Option<&str>) -> String {
    structured_description(BUDGET_PREFIX, equipment, notes)
}

/// "Itens Vendidos: a, b\n\nNotas: ..."
pub fn sale_description(items: &[String], notes: Option<&str>) -> String {
    structured_description(SALE_PREFIX, items, notes)
}

fn structured_description(prefix: &str, items: &[String], notes: Option<&str>) -> String {
    format!(
        "{}{}{}{}{}",
        prefix,
        items.join(", "),
        SECTION_SEPARATOR,
        NOTES_PREFIX,
        notes.unwrap_or_default()
    )
}

/// Resumo curto mostrado nas listagens.
pub fn display_description<T: WeightedTask + ?Sized>(task: &T) -> String {
    match task.service_type() {
        ServiceType::Servico => task
            .predefined_services()
            .iter()
            .map(|s| s.name.as_str())
            .chain(task.custom_services().iter().map(|s| s.name.as_str()))
            .collect::<Vec<_>>()
            .join(", "),
        ServiceType::Venda => task
            .description()
            .map(|d| first_section_body(d, SALE_PREFIX))
            .unwrap_or_default(),
        ServiceType::Orcamento => task
            .description()
            .map(|d| first_section_body(d, BUDGET_PREFIX))
            .unwrap_or_default(),
        ServiceType::Unrecognized(_) => task.description().unwrap_or_default().to_string(),
    }
}

fn first_section_body(description: &str, prefix: &str) -> String {
    let first = description.split(SECTION_SEPARATOR).next().unwrap_or_default();
    first.replace(prefix, "").trim().to_string()
}

fn split_list(line: &str) -> Vec<String> {
    line.split(',').map(|item| item.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::commission::{CommissionTask, CommissionTaskDetail};
    use chrono::Utc;

    fn task(
        technician_id: i32,
        service_type: ServiceType,
        description: Option<&str>,
        commission_value: Option<Decimal>,
    ) -> CommissionTaskDetail {
        CommissionTaskDetail {
            task: CommissionTask {
                id: 1,
                external_os_number: "OS-1".into(),
                description: description.map(str::to_string),
                service_type,
                technician_id,
                technician_username: "tecnico".into(),
                commission_value,
                status: "A Pagar".into(),
                date_completed: Utc::now(),
            },
            services: vec![],
            custom_services: vec![],
        }
    }

    fn predefined(id: i32, weight: i32) -> PredefinedService {
        PredefinedService { id, name: format!("Serviço {}", id), weight }
    }

    fn custom(name: &str, weight: i32) -> CustomServiceItem {
        CustomServiceItem { id: 0, name: name.into(), weight, commission_task_id: 1 }
    }

    fn money(cents: i64) -> Option<Decimal> {
        Some(Decimal::new(cents, 2))
    }

    #[test]
    fn service_sums_predefined_and_custom_weights() {
        let mut t = task(1, ServiceType::Servico, None, None);
        t.services = vec![predefined(1, 4), predefined(2, 2)];
        t.custom_services = vec![custom("Troca de fonte", 3)];
        assert_eq!(total_weight(&t), 9);
    }

    #[test]
    fn service_without_items_weighs_zero() {
        let t = task(1, ServiceType::Servico, Some("sem itens"), None);
        assert_eq!(total_weight(&t), 0);
    }

    #[test]
    fn service_ignores_description_and_value() {
        let mut t = task(
            1,
            ServiceType::Servico,
            Some("Equipamentos Orçados: Notebook"),
            money(100_000),
        );
        t.custom_services = vec![custom("Solda", 1)];
        assert_eq!(total_weight(&t), 1);
    }

    #[test]
    fn budget_weights_high_value_equipment_double() {
        let t = task(
            1,
            ServiceType::Orcamento,
            Some("Equipamentos Orçados: Notebook, Mouse\n\nNotas: x"),
            None,
        );
        assert_eq!(total_weight(&t), 3);
    }

    #[test]
    fn budget_with_every_high_value_item() {
        let equipment: Vec<String> = HighValueEquipment::ALL
            .iter()
            .map(|e| e.label().to_string())
            .collect();
        let description = budget_description(&equipment, None);
        assert_eq!(budget_weight(Some(&description)), 12);
    }

    #[test]
    fn budget_without_description_weighs_zero() {
        assert_eq!(total_weight(&task(1, ServiceType::Orcamento, None, None)), 0);
        assert_eq!(total_weight(&task(1, ServiceType::Orcamento, Some(""), None)), 0);
    }

    #[test]
    fn budget_matching_is_exact() {
        let t = task(
            1,
            ServiceType::Orcamento,
            Some("Equipamentos Orçados: notebook, NOTEBOOK, All In One, Servidor\n\nNotas: "),
            None,
        );
        // só "Servidor" bate exatamente
        assert_eq!(total_weight(&t), 1 + 1 + 1 + 2);
    }

    #[test]
    fn budget_items_are_trimmed() {
        let t = task(
            1,
            ServiceType::Orcamento,
            Some("Equipamentos Orçados:   PC Gamer ,Nobreak  \n\nNotas: urgente"),
            None,
        );
        assert_eq!(total_weight(&t), 4);
    }

    #[test]
    fn budget_without_label_degrades_silently() {
        // Sem o rótulo a seção inteira vira a lista
        let t = task(1, ServiceType::Orcamento, Some("Notebook, Impressora G"), None);
        assert_eq!(total_weight(&t), 4);

        let t = task(1, ServiceType::Orcamento, Some("Equipamentos: Notebook"), None);
        assert_eq!(total_weight(&t), 1);
    }

    #[test]
    fn budget_only_reads_first_section() {
        let t = task(
            1,
            ServiceType::Orcamento,
            Some("Equipamentos Orçados: Mouse\n\nNotas: Notebook, Servidor\n\nmais"),
            None,
        );
        assert_eq!(total_weight(&t), 1);
    }

    #[test]
    fn sale_uses_exact_ceiling_of_value_over_500() {
        let weight = |cents| total_weight(&task(1, ServiceType::Venda, None, money(cents)));
        assert_eq!(weight(500_00), 1);
        assert_eq!(weight(501_00), 2);
        assert_eq!(weight(1000_00), 2);
        assert_eq!(weight(1_00), 1);
        assert_eq!(weight(500_01), 2);
        assert_eq!(weight(999_99), 2);
        assert_eq!(weight(1500_00), 3);
    }

    #[test]
    fn sale_without_value_weighs_zero() {
        assert_eq!(total_weight(&task(1, ServiceType::Venda, Some("Itens Vendidos: SSD"), None)), 0);
        assert_eq!(sale_weight(Some(Decimal::ZERO)), 0);
        assert_eq!(sale_weight(money(-10_00)), 0);
    }

    #[test]
    fn unknown_type_weighs_zero() {
        let mut t = task(
            1,
            ServiceType::Unrecognized("Garantia".into()),
            Some("Equipamentos Orçados: Notebook"),
            money(5000_00),
        );
        t.services = vec![predefined(1, 5)];
        assert_eq!(total_weight(&t), 0);
    }

    #[test]
    fn computation_is_idempotent() {
        let mut t = task(
            1,
            ServiceType::Orcamento,
            Some("Equipamentos Orçados: Notebook, Mouse\n\nNotas: x"),
            None,
        );
        t.custom_services = vec![custom("x", 7)];
        let first = total_weight(&t);
        assert_eq!(total_weight(&t), first);
        assert_eq!(total_weight(&t), first);
    }

    #[test]
    fn difficulty_is_sum_over_one_technicians_tasks() {
        let mut service = task(7, ServiceType::Servico, None, None);
        service.services = vec![predefined(1, 4)];
        let budget = task(
            7,
            ServiceType::Orcamento,
            Some("Equipamentos Orçados: Servidor\n\nNotas: "),
            None,
        );
        let sale = task(7, ServiceType::Venda, None, money(1200_00));
        let other = task(8, ServiceType::Venda, None, money(9000_00));

        let all = vec![service, budget, sale, other];
        let mine: Vec<_> = all.iter().filter(|t| t.task.technician_id == 7).collect();

        let manual: i64 = mine.iter().map(|t| total_weight(*t)).sum();
        assert_eq!(difficulty_score(mine.iter().copied()), manual);
        assert_eq!(manual, 4 + 2 + 3);
        assert_eq!(difficulty_score(std::iter::empty::<&CommissionTaskDetail>()), 0);
    }

    #[test]
    fn descriptions_are_built_in_the_parsed_format() {
        let equipment = vec!["Notebook".to_string(), "Mouse".to_string()];
        let description = budget_description(&equipment, Some("x"));
        assert_eq!(description, "Equipamentos Orçados: Notebook, Mouse\n\nNotas: x");
        assert_eq!(budget_equipment(&description), equipment);

        let sale = sale_description(&["SSD 480".to_string()], None);
        assert_eq!(sale, "Itens Vendidos: SSD 480\n\nNotas: ");
    }

    #[test]
    fn display_description_per_type() {
        let mut service = task(1, ServiceType::Servico, None, None);
        service.services = vec![PredefinedService { id: 1, name: "Formatação".into(), weight: 3 }];
        service.custom_services = vec![custom("Backup", 1)];
        assert_eq!(display_description(&service), "Formatação, Backup");

        let sale = task(1, ServiceType::Venda, Some("Itens Vendidos: SSD, Mouse\n\nNotas: pix"), None);
        assert_eq!(display_description(&sale), "SSD, Mouse");

        let budget = task(1, ServiceType::Orcamento, Some("Equipamentos Orçados: Nobreak\n\nNotas: "), None);
        assert_eq!(display_description(&budget), "Nobreak");

        let empty = task(1, ServiceType::Venda, None, None);
        assert_eq!(display_description(&empty), "");

        let legacy = task(1, ServiceType::Unrecognized("Garantia".into()), Some("troca"), None);
        assert_eq!(display_description(&legacy), "troca");
    }
}
