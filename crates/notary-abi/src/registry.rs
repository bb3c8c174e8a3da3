use alloy_dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy_json_abi::{Function, JsonAbi, Param, StateMutability};
use serde_json::Value;

use crate::error::{AbiError, AbiResult};

/// Name-indexed view of an interface description.
///
/// Every lookup goes through the registry: an unknown name is rejected
/// before anything is encoded, and overloaded names are told apart by
/// argument count.
#[derive(Clone, Debug, Default)]
pub struct FunctionRegistry {
    abi: JsonAbi,
}

/// Calldata for one invocation, paired with the declaration that produced
/// it so the return data can be decoded against the same outputs.
#[derive(Clone, Debug)]
pub struct PreparedCall<'a> {
    pub function: &'a Function,
    pub calldata: Vec<u8>,
}

impl PreparedCall<'_> {
    pub fn decode_output(&self, data: &[u8]) -> AbiResult<Vec<DynSolValue>> {
        self.function
            .abi_decode_output(data, true)
            .map_err(|e| AbiError::Decode(format!("{}: {e}", self.function.name)))
    }
}

/// `pure` and `view` functions never change state.
pub fn is_read_only(function: &Function) -> bool {
    matches!(
        function.state_mutability,
        StateMutability::Pure | StateMutability::View
    )
}

impl FunctionRegistry {
    pub fn new(abi: &JsonAbi) -> Self {
        Self { abi: abi.clone() }
    }

    /// Parse a JSON interface description.
    pub fn from_json(value: &Value) -> AbiResult<Self> {
        let abi: JsonAbi = serde_json::from_value(value.clone())
            .map_err(|e| AbiError::MalformedInterface(e.to_string()))?;
        Ok(Self { abi })
    }

    pub fn interface(&self) -> &JsonAbi {
        &self.abi
    }

    pub fn contains(&self, name: &str) -> bool {
        self.abi.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.abi.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.abi.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abi.functions.is_empty()
    }

    /// Find the declaration of `name` taking `arity` arguments.
    pub fn resolve(&self, name: &str, arity: usize) -> AbiResult<&Function> {
        let candidates = self
            .abi
            .function(name)
            .filter(|overloads| !overloads.is_empty())
            .ok_or_else(|| AbiError::UnknownFunction(name.to_string()))?;
        candidates
            .iter()
            .find(|f| f.inputs.len() == arity)
            .ok_or_else(|| AbiError::ArityMismatch {
                function: name.to_string(),
                expected: candidates[0].inputs.len(),
                actual: arity,
            })
    }

    /// Resolve `name`, coerce `args` to the declared input types, and encode
    /// the call behind its selector.
    pub fn prepare(&self, name: &str, args: &[String]) -> AbiResult<PreparedCall<'_>> {
        let function = self.resolve(name, args.len())?;
        let values = coerce_args(name, &function.inputs, args)?;
        let calldata = function
            .abi_encode_input(&values)
            .map_err(|e| AbiError::Encode(format!("{name}: {e}")))?;
        Ok(PreparedCall { function, calldata })
    }

    /// Append encoded constructor arguments to the creation bytecode.
    ///
    /// A description without a constructor takes no arguments.
    pub fn encode_deploy(&self, bytecode: &[u8], args: &[String]) -> AbiResult<Vec<u8>> {
        let inputs = self
            .abi
            .constructor()
            .map(|c| c.inputs.as_slice())
            .unwrap_or_default();
        let values = coerce_args("constructor", inputs, args)?;
        let mut data = bytecode.to_vec();
        if let Some(constructor) = self.abi.constructor() {
            let encoded = constructor
                .abi_encode_input(&values)
                .map_err(|e| AbiError::Encode(format!("constructor: {e}")))?;
            data.extend_from_slice(&encoded);
        }
        Ok(data)
    }
}

fn coerce_args(function: &str, params: &[Param], args: &[String]) -> AbiResult<Vec<DynSolValue>> {
    if params.len() != args.len() {
        return Err(AbiError::ArityMismatch {
            function: function.to_string(),
            expected: params.len(),
            actual: args.len(),
        });
    }
    params
        .iter()
        .zip(args)
        .enumerate()
        .map(|(index, (param, arg))| {
            let ty: DynSolType = param
                .resolve()
                .map_err(|e| AbiError::UnsupportedType(format!("{}: {e}", param.ty)))?;
            coerce(&ty, arg).map_err(|reason| AbiError::InvalidArgument {
                function: function.to_string(),
                index,
                reason,
            })
        })
        .collect()
}

/// Convert one textual argument to a value of type `ty`.
fn coerce(ty: &DynSolType, arg: &str) -> Result<DynSolValue, String> {
    match ty {
        // strings are passed through as given, quotes and whitespace included
        DynSolType::String => Ok(DynSolValue::String(arg.to_string())),
        DynSolType::FixedBytes(size) => {
            let digits = arg.strip_prefix("0x").unwrap_or(arg);
            if digits.len() != size * 2 {
                return Err(format!("expected {size} bytes of hex, got {arg:?}"));
            }
            ty.coerce_str(arg).map_err(|e| e.to_string())
        }
        _ => ty.coerce_str(arg).map_err(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notary_types::{keccak256, U256};
    use serde_json::json;

    const HASH: &str = "0x949e6011110eee750c48cd49e7b1d298ca2e66d42d8aee6dc4623532ffbd996c";

    fn registry() -> FunctionRegistry {
        FunctionRegistry::from_json(&json!([
            {"type": "function", "name": "addDocument", "stateMutability": "nonpayable",
             "inputs": [{"name": "user", "type": "string"}, {"name": "hash", "type": "bytes32"}],
             "outputs": []},
            {"type": "function", "name": "validateOne", "stateMutability": "view",
             "inputs": [{"name": "user", "type": "string"}, {"name": "hash", "type": "bytes32"}],
             "outputs": [{"name": "", "type": "bytes32[]"}]},
            {"type": "function", "name": "ping", "stateMutability": "pure", "inputs": [], "outputs": []},
            {"type": "function", "name": "ping", "stateMutability": "pure",
             "inputs": [{"name": "n", "type": "uint8"}], "outputs": []},
            {"type": "function", "name": "credit", "stateMutability": "nonpayable",
             "inputs": [{"name": "amount", "type": "uint256"}],
             "outputs": [{"name": "", "type": "uint256"}]}
        ]))
        .unwrap()
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_name_rejected() {
        let err = registry().resolve("removeDocument", 2).unwrap_err();
        assert_eq!(err, AbiError::UnknownFunction("removeDocument".into()));
    }

    #[test]
    fn overloads_selected_by_arity() {
        let reg = registry();
        assert_eq!(reg.resolve("ping", 0).unwrap().signature(), "ping()");
        assert_eq!(reg.resolve("ping", 1).unwrap().signature(), "ping(uint8)");
        assert!(matches!(reg.resolve("ping", 2), Err(AbiError::ArityMismatch { .. })));
    }

    #[test]
    fn prepare_prefixes_selector() {
        let reg = registry();
        let call = reg.prepare("validateOne", &args(&["a@b.com", HASH])).unwrap();
        assert_eq!(&call.calldata[..4], &keccak256("validateOne(string,bytes32)")[..4]);
        assert_eq!(call.calldata.len(), 4 + 4 * 32);
    }

    #[test]
    fn string_arguments_are_verbatim() {
        let reg = registry();
        let quoted = reg.prepare("addDocument", &args(&["\" a@b.com \"", HASH])).unwrap();
        let decoded = quoted.function.abi_decode_input(&quoted.calldata[4..], true).unwrap();
        assert_eq!(decoded[0], DynSolValue::String("\" a@b.com \"".into()));
    }

    #[test]
    fn short_hash_rejected_with_index() {
        let err = registry()
            .prepare("addDocument", &args(&["a@b.com", "0x1234"]))
            .unwrap_err();
        assert!(matches!(err, AbiError::InvalidArgument { index: 1, .. }));
        let err = registry()
            .prepare("addDocument", &args(&["a@b.com", "not-hex"]))
            .unwrap_err();
        assert!(matches!(err, AbiError::InvalidArgument { index: 1, .. }));
    }

    #[test]
    fn full_width_uint_accepted() {
        // 2^128 and the largest uint256 both fit
        let reg = registry();
        for value in [
            "340282366920938463463374607431768211456",
            "115792089237316195423570985008687907853269984665640564039457584007913129639935",
        ] {
            let call = reg.prepare("credit", &args(&[value])).unwrap();
            let word = U256::from_be_slice(&call.calldata[4..]);
            assert_eq!(word.to_string(), value);
        }
        let err = reg
            .prepare(
                "credit",
                &args(&["115792089237316195423570985008687907853269984665640564039457584007913129639936"]),
            )
            .unwrap_err();
        assert!(matches!(err, AbiError::InvalidArgument { index: 0, .. }));
    }

    #[test]
    fn decode_output_against_declaration() {
        let reg = registry();
        let call = reg.prepare("credit", &args(&["7"])).unwrap();
        let out = call
            .decode_output(&DynSolValue::Uint(U256::from(9u64), 256).abi_encode())
            .unwrap();
        assert_eq!(out, vec![DynSolValue::Uint(U256::from(9u64), 256)]);
        assert!(matches!(call.decode_output(&[0x01]), Err(AbiError::Decode(_))));
    }

    #[test]
    fn mutability_flags() {
        let reg = registry();
        assert!(!is_read_only(reg.resolve("addDocument", 2).unwrap()));
        assert!(is_read_only(reg.resolve("validateOne", 2).unwrap()));
    }

    #[test]
    fn legacy_constant_flag_is_read_only() {
        let reg = FunctionRegistry::from_json(&json!([
            {"constant": true, "payable": false, "type": "function", "name": "validateOne",
             "inputs": [{"name": "user", "type": "string"}, {"name": "hash", "type": "bytes32"}],
             "outputs": [{"name": "", "type": "bytes32[]"}]},
            {"anonymous": false, "type": "event", "name": "DocumentAdded",
             "inputs": [{"indexed": false, "name": "user", "type": "string"}]}
        ]))
        .unwrap();
        assert_eq!(reg.len(), 1);
        assert!(is_read_only(reg.resolve("validateOne", 2).unwrap()));
    }

    #[test]
    fn deploy_without_constructor() {
        let reg = registry();
        assert_eq!(reg.encode_deploy(&[0x60, 0x80], &[]).unwrap(), vec![0x60, 0x80]);
        assert!(matches!(
            reg.encode_deploy(&[0x60, 0x80], &args(&["1"])),
            Err(AbiError::ArityMismatch { expected: 0, actual: 1, .. })
        ));
    }

    #[test]
    fn deploy_appends_constructor_arguments() {
        let reg = FunctionRegistry::from_json(&json!([
            {"type": "constructor", "stateMutability": "nonpayable",
             "inputs": [{"name": "limit", "type": "uint256"}]}
        ]))
        .unwrap();
        let data = reg.encode_deploy(&[0x60, 0x80], &args(&["5"])).unwrap();
        assert_eq!(data.len(), 2 + 32);
        assert_eq!(data[..2], [0x60, 0x80]);
        assert_eq!(data[33], 5);
    }

    #[test]
    fn names_are_sorted_and_unique() {
        let reg = registry();
        let names: Vec<&str> = reg.names().collect();
        assert_eq!(names, vec!["addDocument", "credit", "ping", "validateOne"]);
        assert_eq!(reg.len(), 4);
    }

    #[test]
    fn rejects_non_array() {
        assert!(matches!(
            FunctionRegistry::from_json(&json!({"abi": []})),
            Err(AbiError::MalformedInterface(_))
        ));
    }
}
