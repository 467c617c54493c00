use crate::core::ActionType;
use crate::importers::ImportError;

/// Action text prefixes, most specific first. The first matching prefix wins.
const PREFIXES: &[(&str, ActionType)] = &[
    ("YOU BOUGHT", ActionType::Buy),
    ("YOU SOLD", ActionType::Sell),
    ("REINVESTMENT", ActionType::Reinvest),
    ("DIVIDEND RECEIVED FOREIGN TAX", ActionType::ForeignTaxPaid),
    ("DIVIDEND RECEIVED", ActionType::DividendReceived),
    ("LONG-TERM CAP GAIN", ActionType::LongTermCapGain),
    ("SHORT-TERM CAP GAIN", ActionType::ShortTermCapGain),
    ("RETURN OF CAPITAL", ActionType::ReturnOfCapital),
    ("INTEREST EARNED", ActionType::InterestEarned),
    ("MERGER NEW SHARES", ActionType::MergerNew),
    ("MERGER OLD SHARES", ActionType::MergerOld),
    ("REVERSE SPLIT", ActionType::ReverseSplit),
    ("DISTRIBUTION", ActionType::Split),
    ("SPIN-OFF", ActionType::SpinOff),
    ("REDEMPTION PAYOUT", ActionType::Redemption),
    ("ELECTRONIC FUNDS TRANSFER RECEIVED", ActionType::Deposit),
    ("ELECTRONIC FUNDS TRANSFER PAID", ActionType::Withdrawal),
    ("TRANSFERRED FROM", ActionType::TransferIn),
    ("TRANSFERRED TO", ActionType::TransferOut),
    ("PARTIC CONTR", ActionType::Contribution),
    ("JOURNALED", ActionType::Journal),
    ("FEE CHARGED", ActionType::FeeCharged),
    ("FOREIGN TAX PAID", ActionType::ForeignTaxPaid),
    ("IN LIEU OF FRX SHARE", ActionType::CashInLieu),
];

/// Map the action text of a history row to its action. The transaction type
/// follows from the action.
pub fn classify(action: &str) -> Result<ActionType, ImportError> {
    let upper = action.trim().to_uppercase();
    PREFIXES
        .iter()
        .find(|(prefix, _)| upper.starts_with(prefix))
        .map(|(_, action_type)| *action_type)
        .ok_or_else(|| ImportError::UnknownAction(action.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TransactionType;

    #[test]
    fn no_prefix_is_shadowed_by_an_earlier_one() {
        for (i, (prefix, _)) in PREFIXES.iter().enumerate() {
            for (earlier, _) in &PREFIXES[..i] {
                assert!(
                    !prefix.starts_with(earlier),
                    "{prefix} is unreachable behind {earlier}"
                );
            }
        }
    }

    #[test]
    fn classifies_common_actions() {
        let cases = [
            ("YOU BOUGHT APPLE INC (AAPL) (Cash)", ActionType::Buy),
            ("DIVIDEND RECEIVED APPLE INC (AAPL) (Cash)", ActionType::DividendReceived),
            (
                "DIVIDEND RECEIVED FOREIGN TAX WITHHELD NESTLE (NSRGY)",
                ActionType::ForeignTaxPaid,
            ),
            (" Electronic Funds Transfer Received (Cash)", ActionType::Deposit),
            (
                "MERGER NEW SHARES FROM (ATVI) MICROSOFT CORP (MSFT)",
                ActionType::MergerNew,
            ),
        ];
        for (text, expected) in cases {
            assert_eq!(classify(text).unwrap(), expected, "{text}");
        }
        assert_eq!(
            classify("INTEREST EARNED FDIC INSURED DEPOSIT")
                .unwrap()
                .transaction_type(),
            TransactionType::Interest
        );
    }

    #[test]
    fn unknown_action_is_fatal() {
        assert!(matches!(
            classify("SOMETHING NEW"),
            Err(ImportError::UnknownAction(text)) if text == "SOMETHING NEW"
        ));
    }
}
